use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{RecordKind, ShortcutId, TopWindow, UserId};

/// The API sends `"Never"` for users that have not logged in yet.
pub const NEVER_LOGGED_IN: &str = "Never";

const SQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses the timestamp strings the API emits, either RFC 3339 or the
/// database's `YYYY-MM-DD HH:MM:SS` form (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, SQL_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    #[serde(rename = "ID", default)]
    pub id: ShortcutId,
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: String,
    #[serde(rename = "CreatedBy", default)]
    pub created_by: UserId,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: String,
    #[serde(rename = "UpdatedBy", default)]
    pub updated_by: UserId,
    #[serde(
        rename = "UpdatedByName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_by_name: Option<String>,
    /// Only populated by the top-shortcuts endpoint.
    #[serde(rename = "TotalVisits", default, skip_serializing_if = "Option::is_none")]
    pub total_visits: Option<i64>,
}

impl Shortcut {
    pub fn new(code: &str, url: impl Into<String>) -> Self {
        Self {
            code: normalize_code(code),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }
}

/// Codes are stored lowercase; input is folded as it is entered.
pub fn normalize_code(code: &str) -> String {
    code.to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID", default)]
    pub id: UserId,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Active", default)]
    pub active: bool,
    #[serde(rename = "Admin", default)]
    pub admin: bool,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: String,
    #[serde(rename = "LastLoggedIn", default)]
    pub last_logged_in: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            active: true,
            ..Self::default()
        }
    }

    pub fn has_logged_in(&self) -> bool {
        !self.last_logged_in.is_empty() && self.last_logged_in != NEVER_LOGGED_IN
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        if !self.has_logged_in() {
            return None;
        }
        parse_timestamp(&self.last_logged_in)
    }
}

/// One page of a listing, independent of the envelope it arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total_count: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            total_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortcutListing {
    #[serde(default, deserialize_with = "null_as_default")]
    pub shortcuts: Vec<Shortcut>,
    #[serde(default)]
    pub total_count: u64,
}

/// Turns a listing envelope into the page `query` asked for.
pub trait IntoPage<T> {
    fn into_page(self, query: &ListQuery) -> Page<T>;
}

impl<T> Page<T> {
    /// Filters by case-insensitive `key` prefix and cuts out the requested
    /// page, for endpoints that always return the whole collection.
    pub fn sliced_locally(records: Vec<T>, query: &ListQuery, key: impl Fn(&T) -> &str) -> Self {
        let prefix = query.filter.to_lowercase();
        let matching: Vec<T> = records
            .into_iter()
            .filter(|record| key(record).to_lowercase().starts_with(&prefix))
            .collect();
        let total_count = matching.len() as u64;
        let limit = query.limit.max(1) as usize;
        let start = (query.page.max(1) as usize - 1).saturating_mul(limit);
        Self {
            records: matching.into_iter().skip(start).take(limit).collect(),
            total_count,
        }
    }
}

/// The shortcuts endpoint filters and pages on the server.
impl IntoPage<Shortcut> for ShortcutListing {
    fn into_page(self, _query: &ListQuery) -> Page<Shortcut> {
        Page {
            records: self.shortcuts,
            total_count: self.total_count,
        }
    }
}

/// The users endpoint ignores `limit`, `page` and `name` and returns every
/// user without a total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserListing {
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl IntoPage<User> for UserListing {
    fn into_page(self, query: &ListQuery) -> Page<User> {
        match self.total_count {
            // A server that reports a total has already paged the result.
            Some(total_count) => Page {
                records: self.users,
                total_count,
            },
            None => Page::sliced_locally(self.users, query, |user| user.name.as_str()),
        }
    }
}

/// Query parameters for a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub filter: String,
}

impl ListQuery {
    pub fn new(page: u32, limit: u32, filter: impl Into<String>) -> Self {
        Self {
            page: page.max(1),
            limit,
            filter: filter.into(),
        }
    }

    pub fn to_pairs(&self, kind: RecordKind) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.limit.to_string()),
            ("page", self.page.to_string()),
            (kind.filter_param(), self.filter.clone()),
        ]
    }
}

/// Body returned by create, update and delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecord {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopShortcuts {
    #[serde(default, deserialize_with = "null_as_default")]
    pub today: Vec<Shortcut>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub this_week: Vec<Shortcut>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub this_month: Vec<Shortcut>,
}

impl TopShortcuts {
    pub fn window(&self, window: TopWindow) -> &[Shortcut] {
        match window {
            TopWindow::Today => &self.today,
            TopWindow::ThisWeek => &self.this_week,
            TopWindow::ThisMonth => &self.this_month,
        }
    }
}
