use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::RecordKind,
    error::ApiError,
    protocol::{
        CurrentUserResponse, IntoPage, ListQuery, Page, SavedRecord, Shortcut,
        ShortcutListing, TopShortcuts, User, UserListing,
    },
    validation::Validate,
};
use tracing::{debug, instrument};

pub mod context;
pub mod editor;
pub mod error;
pub mod list;
pub mod visits;

pub use context::{
    AppContext, ClientEvent, Confirmer, Endpoints, Navigator, NoticeLevel, Route,
};
pub use editor::{EditTarget, RecordEditor};
pub use error::{ClientError, ClientResult};
pub use list::{ListController, ListState, DEFAULT_PAGE_SIZE};
pub use visits::TopShortcutsBoard;

/// Name of the cookie the auth gateway stores the session token in.
pub const SESSION_COOKIE: &str = "jwt";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A record kind managed through the list/editor pattern.
pub trait Record:
    Clone + Debug + Default + Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{
    const KIND: RecordKind;
    /// Envelope the listing endpoint wraps this record kind in.
    type Listing: DeserializeOwned + IntoPage<Self> + Send;

    fn raw_id(&self) -> i64;
    /// Human name used in prompts: the code of a shortcut, the name of a user.
    fn label(&self) -> &str;
    fn list_route() -> Route;
    fn new_route() -> Route;
    fn edit_route(self) -> Route;

    fn is_unsaved(&self) -> bool {
        self.raw_id() == 0
    }
}

impl Record for Shortcut {
    const KIND: RecordKind = RecordKind::Shortcut;
    type Listing = ShortcutListing;

    fn raw_id(&self) -> i64 {
        self.id.0
    }

    fn label(&self) -> &str {
        &self.code
    }

    fn list_route() -> Route {
        Route::Shortcuts
    }

    fn new_route() -> Route {
        Route::NewShortcut
    }

    fn edit_route(self) -> Route {
        Route::EditShortcut(self)
    }
}

impl Record for User {
    const KIND: RecordKind = RecordKind::User;
    type Listing = UserListing;

    fn raw_id(&self) -> i64 {
        self.id.0
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn list_route() -> Route {
        Route::Users
    }

    fn new_route() -> Route {
        Route::NewUser
    }

    fn edit_route(self) -> Route {
        Route::EditUser(self)
    }
}

/// CRUD surface of one collection.
#[async_trait]
pub trait RecordApi<R: Record>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> ClientResult<Page<R>>;
    async fn create(&self, record: &R) -> ClientResult<SavedRecord>;
    async fn update(&self, record: &R) -> ClientResult<SavedRecord>;
    async fn delete(&self, id: i64) -> ClientResult<()>;
}

/// Read paths that sit outside the per-collection CRUD surface.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn top_shortcuts(&self) -> ClientResult<TopShortcuts>;
    async fn current_user(&self) -> ClientResult<User>;
}

/// `reqwest` implementation of the API seams. Every request carries the
/// session cookie.
#[derive(Clone)]
pub struct HttpAdminClient {
    http: Client,
    endpoints: Endpoints,
}

impl HttpAdminClient {
    pub fn new(endpoints: Endpoints, session_token: Option<&str>) -> ClientResult<Self> {
        Self::with_timeout(endpoints, session_token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        endpoints: Endpoints,
        session_token: Option<&str>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = session_token.filter(|token| !token.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}"))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }
        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, endpoints })
    }

    async fn execute(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::new(status.as_u16(), message).into());
        }
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let body = self.execute(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl<R: Record> RecordApi<R> for HttpAdminClient {
    #[instrument(skip(self), fields(collection = R::KIND.collection()))]
    async fn list(&self, query: &ListQuery) -> ClientResult<Page<R>> {
        let url = self.endpoints.api(R::KIND.collection())?;
        let listing: R::Listing = self
            .fetch_json(self.http.get(url).query(&query.to_pairs(R::KIND)))
            .await?;
        Ok(listing.into_page(query))
    }

    async fn create(&self, record: &R) -> ClientResult<SavedRecord> {
        let url = self
            .endpoints
            .api(&format!("{}/", R::KIND.collection()))?;
        debug!(%url, "creating record");
        self.fetch_json(self.http.post(url).json(record)).await
    }

    async fn update(&self, record: &R) -> ClientResult<SavedRecord> {
        let url = self
            .endpoints
            .api(&format!("{}/{}", R::KIND.collection(), record.raw_id()))?;
        debug!(%url, "updating record");
        self.fetch_json(self.http.put(url).json(record)).await
    }

    async fn delete(&self, id: i64) -> ClientResult<()> {
        let url = self
            .endpoints
            .api(&format!("{}/{id}", R::KIND.collection()))?;
        debug!(%url, "deleting record");
        self.execute(self.http.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl AdminApi for HttpAdminClient {
    async fn top_shortcuts(&self) -> ClientResult<TopShortcuts> {
        let url = self.endpoints.api("shortcuts/top")?;
        self.fetch_json(self.http.get(url)).await
    }

    async fn current_user(&self) -> ClientResult<User> {
        let url = self.endpoints.api("users/me")?;
        let body: CurrentUserResponse = self.fetch_json(self.http.get(url)).await?;
        Ok(body.user)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
