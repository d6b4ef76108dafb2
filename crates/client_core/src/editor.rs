//! Create/update form for a single record.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::protocol::{normalize_code, SavedRecord, Shortcut, User};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    context::AppContext,
    error::{ClientError, ClientResult},
    Record, RecordApi,
};

/// What the editor was opened for. Decides between POST and PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget<R> {
    New,
    Editing(R),
}

impl<R: Record> EditTarget<R> {
    /// A record the server never assigned an id to is treated as new.
    pub fn for_record(record: Option<R>) -> Self {
        match record {
            Some(record) if !record.is_unsaved() => EditTarget::Editing(record),
            _ => EditTarget::New,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, EditTarget::New)
    }
}

struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct RecordEditor<R: Record> {
    api: Arc<dyn RecordApi<R>>,
    ctx: AppContext,
    target: EditTarget<R>,
    draft: Mutex<R>,
    saving: AtomicBool,
}

impl<R: Record> RecordEditor<R> {
    pub fn open(api: Arc<dyn RecordApi<R>>, ctx: AppContext, target: EditTarget<R>) -> Self {
        let draft = match &target {
            EditTarget::New => R::default(),
            EditTarget::Editing(record) => record.clone(),
        };
        Self {
            api,
            ctx,
            target,
            draft: Mutex::new(draft),
            saving: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &EditTarget<R> {
        &self.target
    }

    pub fn title(&self) -> String {
        let verb = if self.target.is_new() { "New" } else { "Edit" };
        format!("{verb} {}", R::KIND.title())
    }

    /// Set while a save request is outstanding; the submit control is
    /// disabled meanwhile.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    pub async fn draft(&self) -> R {
        self.draft.lock().await.clone()
    }

    pub async fn edit(&self, apply: impl FnOnce(&mut R)) {
        let mut draft = self.draft.lock().await;
        apply(&mut *draft);
    }

    /// Checks the draft without submitting it.
    pub async fn validate(&self) -> ClientResult<()> {
        self.draft.lock().await.validate()?;
        Ok(())
    }

    /// Validates, then creates or updates the record. On success the console
    /// returns to the list view; on failure the draft is kept for a retry.
    pub async fn save(&self) -> ClientResult<SavedRecord> {
        if self.saving.swap(true, Ordering::SeqCst) {
            return Err(ClientError::SaveInProgress);
        }
        let _saving = SavingGuard(&self.saving);

        let draft = self.draft.lock().await.clone();
        if let Err(err) = draft.validate() {
            self.ctx.notify_error(err.to_string());
            return Err(err.into());
        }

        let noun = R::KIND.noun();
        let result = match &self.target {
            EditTarget::New => self.api.create(&draft).await,
            EditTarget::Editing(_) => self.api.update(&draft).await,
        };
        match result {
            Ok(saved) => {
                info!(collection = R::KIND.collection(), id = saved.id, "record saved");
                self.ctx
                    .notify_success(format!("{} saved!", R::KIND.title()));
                self.ctx.navigate(R::list_route());
                Ok(saved)
            }
            Err(err) => {
                self.ctx.report_failure(&err, || {
                    format!(
                        "Failed to save {noun}. Maybe it already exists? {}",
                        err.server_message()
                    )
                });
                Err(err)
            }
        }
    }

    /// Leaves the form without saving.
    pub fn cancel(&self) {
        self.ctx.navigate(R::list_route());
    }
}

impl RecordEditor<Shortcut> {
    /// Codes are folded to lowercase as they are typed.
    pub async fn set_code(&self, code: &str) {
        self.draft.lock().await.code = normalize_code(code);
    }

    pub async fn set_url(&self, url: &str) {
        self.draft.lock().await.url = url.to_string();
    }

    pub async fn last_updated_line(&self) -> Option<String> {
        let draft = self.draft.lock().await;
        if draft.updated_at.is_empty() {
            return None;
        }
        let when = draft
            .updated()
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| draft.updated_at.clone());
        let who = draft
            .updated_by_name
            .clone()
            .unwrap_or_else(|| format!("user #{}", draft.updated_by));
        Some(format!("Last updated at {when} by {who}."))
    }
}

impl RecordEditor<User> {
    pub async fn set_name(&self, name: &str) {
        self.draft.lock().await.name = name.to_string();
    }

    pub async fn set_email(&self, email: &str) {
        self.draft.lock().await.email = email.to_string();
    }

    pub async fn set_active(&self, active: bool) {
        self.draft.lock().await.active = active;
    }

    pub async fn set_admin(&self, admin: bool) {
        self.draft.lock().await.admin = admin;
    }

    pub async fn last_login_line(&self) -> Option<String> {
        let draft = self.draft.lock().await;
        if !draft.has_logged_in() {
            return None;
        }
        let when = draft
            .last_login()
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| draft.last_logged_in.clone());
        Some(format!("Last logged in: {when}"))
    }
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
