//! In-memory stand-ins for the API, navigation and confirmation seams.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex as StdMutex},
};

use async_trait::async_trait;
use shared::{
    domain::{ShortcutId, UserId},
    error::ApiError,
    protocol::{ListQuery, Page, SavedRecord, Shortcut, TopShortcuts, User},
};
use tokio::sync::{broadcast, oneshot, Mutex};

use crate::{
    AdminApi, AppContext, ClientError, ClientEvent, ClientResult, Confirmer, Endpoints,
    Navigator, NoticeLevel, Record, RecordApi, Route,
};

pub(crate) const TEST_ROOT: &str = "http://admin.test";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiCall {
    List(ListQuery),
    Create(String),
    Update(i64),
    Delete(i64),
}

#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Unauthorized,
    Server(u16, &'static str),
}

impl Failure {
    fn to_error(&self) -> ClientError {
        match self {
            Failure::Unauthorized => ClientError::Unauthorized,
            Failure::Server(status, message) => ApiError::new(*status, *message).into(),
        }
    }
}

pub(crate) trait TestRecord: Record {
    fn with_id(self, id: i64) -> Self;
}

impl TestRecord for Shortcut {
    fn with_id(mut self, id: i64) -> Self {
        self.id = ShortcutId(id);
        self
    }
}

impl TestRecord for User {
    fn with_id(mut self, id: i64) -> Self {
        self.id = UserId(id);
        self
    }
}

/// Serves listings by label prefix, the way the real API filters codes.
pub(crate) struct FakeRecordApi<R> {
    pub records: Mutex<Vec<R>>,
    pub calls: Mutex<Vec<ApiCall>>,
    pub fail_list: Mutex<Option<Failure>>,
    pub fail_writes: Mutex<Option<Failure>>,
    held_lists: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl<R: TestRecord> FakeRecordApi<R> {
    pub fn with_records(records: Vec<R>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            fail_list: Mutex::new(None),
            fail_writes: Mutex::new(None),
            held_lists: Mutex::new(VecDeque::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::with_records(Vec::new())
    }

    /// The next listing call waits until the returned sender fires.
    pub async fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held_lists.lock().await.push_back(rx);
        tx
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().await.clone()
    }

    pub async fn list_calls(&self) -> Vec<ListQuery> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                ApiCall::List(query) => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    async fn write_failure(&self) -> Option<ClientError> {
        self.fail_writes.lock().await.as_ref().map(Failure::to_error)
    }
}

#[async_trait]
impl<R: TestRecord> RecordApi<R> for FakeRecordApi<R> {
    async fn list(&self, query: &ListQuery) -> ClientResult<Page<R>> {
        let held = self.held_lists.lock().await.pop_front();
        self.calls.lock().await.push(ApiCall::List(query.clone()));
        if let Some(held) = held {
            let _ = held.await;
        }
        if let Some(failure) = self.fail_list.lock().await.as_ref() {
            return Err(failure.to_error());
        }

        let matching: Vec<R> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.label().starts_with(&query.filter))
            .cloned()
            .collect();
        let total_count = matching.len() as u64;
        let start = ((query.page - 1) * query.limit) as usize;
        let records = matching
            .into_iter()
            .skip(start)
            .take(query.limit as usize)
            .collect();
        Ok(Page {
            records,
            total_count,
        })
    }

    async fn create(&self, record: &R) -> ClientResult<SavedRecord> {
        self.calls
            .lock()
            .await
            .push(ApiCall::Create(record.label().to_string()));
        if let Some(err) = self.write_failure().await {
            return Err(err);
        }
        let mut records = self.records.lock().await;
        let id = records.iter().map(|record| record.raw_id()).max().unwrap_or(0) + 1;
        records.push(record.clone().with_id(id));
        Ok(SavedRecord { id })
    }

    async fn update(&self, record: &R) -> ClientResult<SavedRecord> {
        self.calls.lock().await.push(ApiCall::Update(record.raw_id()));
        if let Some(err) = self.write_failure().await {
            return Err(err);
        }
        let mut records = self.records.lock().await;
        if let Some(existing) = records
            .iter_mut()
            .find(|existing| existing.raw_id() == record.raw_id())
        {
            *existing = record.clone();
        }
        Ok(SavedRecord {
            id: record.raw_id(),
        })
    }

    async fn delete(&self, id: i64) -> ClientResult<()> {
        self.calls.lock().await.push(ApiCall::Delete(id));
        if let Some(err) = self.write_failure().await {
            return Err(err);
        }
        self.records.lock().await.retain(|record| record.raw_id() != id);
        Ok(())
    }
}

pub(crate) struct FakeAdminApi {
    pub top: Mutex<Result<TopShortcuts, Failure>>,
    pub me: Mutex<Result<User, Failure>>,
}

impl FakeAdminApi {
    pub fn new(top: Result<TopShortcuts, Failure>, me: Result<User, Failure>) -> Arc<Self> {
        Arc::new(Self {
            top: Mutex::new(top),
            me: Mutex::new(me),
        })
    }
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn top_shortcuts(&self) -> ClientResult<TopShortcuts> {
        self.top.lock().await.clone().map_err(|failure| failure.to_error())
    }

    async fn current_user(&self) -> ClientResult<User> {
        self.me.lock().await.clone().map_err(|failure| failure.to_error())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub routes: StdMutex<Vec<Route>>,
    pub redirects: StdMutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("routes lock").clone()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().expect("redirects lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("routes lock").push(route);
    }

    fn redirect_external(&self, url: &str) {
        self.redirects
            .lock()
            .expect("redirects lock")
            .push(url.to_string());
    }
}

pub(crate) struct ScriptedConfirmer {
    answer: bool,
    pub prompts: StdMutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            prompts: StdMutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        self.answer
    }
}

pub(crate) fn test_context() -> (AppContext, Arc<RecordingNavigator>) {
    context_for(TEST_ROOT)
}

pub(crate) fn context_for(root: &str) -> (AppContext, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let endpoints = Endpoints::new(root, "https://dxe.io/").expect("endpoints");
    (AppContext::new(endpoints, navigator.clone()), navigator)
}

pub(crate) fn drain_notices(
    rx: &mut broadcast::Receiver<ClientEvent>,
) -> Vec<(NoticeLevel, String)> {
    let mut notices = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ClientEvent::Notice { level, message } = event {
            notices.push((level, message));
        }
    }
    notices
}

pub(crate) fn shortcut(id: i64, code: &str) -> Shortcut {
    Shortcut {
        id: ShortcutId(id),
        code: code.to_string(),
        url: format!("https://example.org/{code}"),
        ..Shortcut::default()
    }
}

pub(crate) fn numbered_shortcuts(count: i64) -> Vec<Shortcut> {
    (1..=count)
        .map(|n| shortcut(n, &format!("link{n:02}")))
        .collect()
}
