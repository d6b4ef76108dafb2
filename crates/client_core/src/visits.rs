//! Read-only dashboard of the most visited shortcuts.

use std::sync::Arc;

use shared::{domain::TopWindow, protocol::{Shortcut, TopShortcuts}};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{context::AppContext, error::ClientResult, AdminApi};

pub struct TopShortcutsBoard {
    api: Arc<dyn AdminApi>,
    ctx: AppContext,
    data: Mutex<Option<TopShortcuts>>,
}

impl TopShortcutsBoard {
    pub fn new(api: Arc<dyn AdminApi>, ctx: AppContext) -> Self {
        Self {
            api,
            ctx,
            data: Mutex::new(None),
        }
    }

    /// Replaces the displayed windows with fresh counts. A failed load keeps
    /// whatever was shown before.
    pub async fn load(&self) -> ClientResult<()> {
        match self.api.top_shortcuts().await {
            Ok(top) => {
                debug!(
                    today = top.today.len(),
                    this_week = top.this_week.len(),
                    this_month = top.this_month.len(),
                    "top shortcuts loaded"
                );
                *self.data.lock().await = Some(top);
                Ok(())
            }
            Err(err) => {
                self.ctx.report_failure(&err, || {
                    format!("Failed to load top shortcuts: {}", err.server_message())
                });
                Err(err)
            }
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.data.lock().await.is_some()
    }

    pub async fn window(&self, window: TopWindow) -> Vec<Shortcut> {
        self.data
            .lock()
            .await
            .as_ref()
            .map(|top| top.window(window).to_vec())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "tests/visits_tests.rs"]
mod tests;
