use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Zero marks a record the server has not assigned an id to yet.
            pub fn is_unsaved(self) -> bool {
                self.0 == 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ShortcutId);
id_newtype!(UserId);

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Shortcut,
    User,
}

impl RecordKind {
    /// Path segment under `/api`.
    pub fn collection(self) -> &'static str {
        match self {
            RecordKind::Shortcut => "shortcuts",
            RecordKind::User => "users",
        }
    }

    /// Lowercase noun used in notices and prompts.
    pub fn noun(self) -> &'static str {
        match self {
            RecordKind::Shortcut => "shortcut",
            RecordKind::User => "user",
        }
    }

    /// Capitalized noun used in success notices.
    pub fn title(self) -> &'static str {
        match self {
            RecordKind::Shortcut => "Shortcut",
            RecordKind::User => "User",
        }
    }

    /// Query parameter the listing endpoint filters on.
    pub fn filter_param(self) -> &'static str {
        match self {
            RecordKind::Shortcut => "code",
            RecordKind::User => "name",
        }
    }
}

/// Fixed reporting windows served by the top-shortcuts endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopWindow {
    Today,
    ThisWeek,
    ThisMonth,
}

impl TopWindow {
    pub const ALL: [TopWindow; 3] = [TopWindow::Today, TopWindow::ThisWeek, TopWindow::ThisMonth];

    pub fn label(self) -> &'static str {
        match self {
            TopWindow::Today => "Today",
            TopWindow::ThisWeek => "This Week",
            TopWindow::ThisMonth => "This Month",
        }
    }
}
