//! Paginated, searchable listing of one record kind.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::protocol::ListQuery;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    context::{AppContext, Confirmer},
    error::ClientResult,
    Record, RecordApi,
};

pub const DEFAULT_PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<R> {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
    pub filter: String,
    pub total_count: u64,
    pub records: Vec<R>,
    /// True until the first load attempt has finished, whatever its outcome.
    pub initial_loading: bool,
    pub loading: bool,
}

impl<R> ListState<R> {
    fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            filter: String::new(),
            total_count: 0,
            records: Vec::new(),
            initial_loading: true,
            loading: false,
        }
    }

    pub fn page_count(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.limit))
    }

    /// Whether "nothing found" should be shown rather than a spinner.
    pub fn shows_empty_state(&self) -> bool {
        !self.initial_loading && !self.loading && self.records.is_empty()
    }
}

/// Owns the listing state and reloads it from the server whenever the page
/// or filter changes and after every mutation.
///
/// Loads may overlap; each one takes a ticket and only the response to the
/// most recently issued ticket is applied.
pub struct ListController<R: Record> {
    api: Arc<dyn RecordApi<R>>,
    ctx: AppContext,
    confirmer: Arc<dyn Confirmer>,
    state: Mutex<ListState<R>>,
    latest_ticket: AtomicU64,
}

impl<R: Record> ListController<R> {
    pub fn new(
        api: Arc<dyn RecordApi<R>>,
        ctx: AppContext,
        confirmer: Arc<dyn Confirmer>,
        limit: u32,
    ) -> Self {
        Self {
            api,
            ctx,
            confirmer,
            state: Mutex::new(ListState::new(limit.max(1))),
            latest_ticket: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> ListState<R> {
        self.state.lock().await.clone()
    }

    pub async fn records(&self) -> Vec<R> {
        self.state.lock().await.records.clone()
    }

    pub async fn page_count(&self) -> u64 {
        self.state.lock().await.page_count()
    }

    /// Fetches `page` with `filter` and, unless a newer load was issued in
    /// the meantime, makes it the displayed page.
    pub async fn load(&self, page: u32, filter: &str) -> ClientResult<()> {
        let (ticket, query) = {
            let mut state = self.state.lock().await;
            let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
            let query = ListQuery::new(page, state.limit, filter);
            state.page = query.page;
            state.filter = query.filter.clone();
            state.loading = true;
            (ticket, query)
        };
        debug!(
            collection = R::KIND.collection(),
            page = query.page,
            filter = %query.filter,
            ticket,
            "loading listing"
        );

        let result = self.api.list(&query).await;

        let mut state = self.state.lock().await;
        if self.latest_ticket.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "discarding stale listing response");
            return Ok(());
        }
        state.loading = false;
        state.initial_loading = false;
        match result {
            Ok(page) => {
                state.records = page.records;
                state.total_count = page.total_count;
                Ok(())
            }
            Err(err) => {
                drop(state);
                self.ctx.report_failure(&err, || {
                    format!("Failed to load {}s. Please try again.", R::KIND.noun())
                });
                Err(err)
            }
        }
    }

    /// Reloads the current page with the current filter.
    pub async fn reload(&self) -> ClientResult<()> {
        let (page, filter) = {
            let state = self.state.lock().await;
            (state.page, state.filter.clone())
        };
        self.load(page, &filter).await
    }

    /// Applies a new filter. Always issues exactly one load, on page 1.
    pub async fn search(&self, text: &str) -> ClientResult<()> {
        self.load(1, text).await
    }

    pub async fn set_page(&self, page: u32) -> ClientResult<()> {
        let filter = self.state.lock().await.filter.clone();
        self.load(page, &filter).await
    }

    /// Deletes `record` after confirmation and reloads the current page.
    /// Returns `Ok(false)` when the confirmation was declined.
    pub async fn delete(&self, record: &R) -> ClientResult<bool> {
        let noun = R::KIND.noun();
        let prompt = format!("Are you sure you want to delete the {noun}: {}?", record.label());
        if !self.confirmer.confirm(&prompt) {
            debug!(id = record.raw_id(), "delete declined");
            return Ok(false);
        }

        if let Err(err) = self.api.delete(record.raw_id()).await {
            self.ctx.report_failure(&err, || {
                format!("Failed to delete {noun}: {}", err.server_message())
            });
            return Err(err);
        }

        info!(collection = R::KIND.collection(), id = record.raw_id(), "record deleted");
        self.ctx
            .notify_success(format!("{} deleted!", R::KIND.title()));
        if let Err(err) = self.reload().await {
            debug!(error = %err, "reload after delete failed");
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
