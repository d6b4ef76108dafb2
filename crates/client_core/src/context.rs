//! Application context handed to every controller: endpoint layout,
//! navigation, user-visible notices and the signed-in user.

use std::sync::Arc;

use shared::protocol::{Shortcut, User};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{ClientError, ClientResult},
    AdminApi,
};

const EVENT_CAPACITY: usize = 256;

/// URL layout of the service: the API lives under `<root>/api/`, the auth
/// gateway under `<root>/auth/`, and public short links under
/// `short_link_base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    root: Url,
    short_link_base: String,
}

impl Endpoints {
    pub fn new(root_url: &str, short_link_base: impl Into<String>) -> ClientResult<Self> {
        let mut root = Url::parse(root_url.trim())?;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        Ok(Self {
            root,
            short_link_base: short_link_base.into(),
        })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn api(&self, path: &str) -> ClientResult<Url> {
        Ok(self.root.join(&format!("api/{path}"))?)
    }

    pub fn login_url(&self) -> String {
        self.auth("login")
    }

    pub fn logout_url(&self) -> String {
        self.auth("logout")
    }

    fn auth(&self, action: &str) -> String {
        match self.root.join(&format!("auth/{action}")) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}auth/{action}", self.root),
        }
    }

    pub fn share_link(&self, code: &str) -> String {
        format!("{}{code}", self.short_link_base)
    }
}

/// Views of the console. Editing routes carry the record being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Shortcuts,
    NewShortcut,
    EditShortcut(Shortcut),
    Visits,
    Users,
    NewUser,
    EditUser(User),
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Shortcuts => "/",
            Route::NewShortcut => "/new",
            Route::EditShortcut(_) => "/edit",
            Route::Visits => "/visits",
            Route::Users => "/users",
            Route::NewUser => "/new_user",
            Route::EditUser(_) => "/edit_user",
        }
    }

    /// User management views are only offered to admins.
    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::Users | Route::NewUser | Route::EditUser(_))
    }
}

pub trait Navigator: Send + Sync {
    /// Switch to another view of the console.
    fn navigate(&self, route: Route);
    /// Leave the console for an external page (login, logout).
    fn redirect_external(&self, url: &str);
}

/// Interactive yes/no question asked before destructive actions.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Notice { level: NoticeLevel, message: String },
    CurrentUserChanged(Option<User>),
}

#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    endpoints: Endpoints,
    navigator: Arc<dyn Navigator>,
    events: broadcast::Sender<ClientEvent>,
    current_user: RwLock<Option<User>>,
}

impl AppContext {
    pub fn new(endpoints: Endpoints, navigator: Arc<dyn Navigator>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(AppContextInner {
                endpoints,
                navigator,
                events,
                current_user: RwLock::new(None),
            }),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    pub fn navigate(&self, route: Route) {
        debug!(path = route.path(), "navigating");
        self.inner.navigator.navigate(route);
    }

    pub fn redirect_to_login(&self) {
        let url = self.inner.endpoints.login_url();
        info!(%url, "not authenticated, redirecting to login");
        self.inner.navigator.redirect_external(&url);
    }

    pub fn logout(&self) {
        let url = self.inner.endpoints.logout_url();
        info!(%url, "logging out");
        self.inner.navigator.redirect_external(&url);
    }

    pub fn share_link(&self, code: &str) -> String {
        self.inner.endpoints.share_link(code)
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Error => warn!(%message, "error notice"),
            _ => debug!(%message, "notice"),
        }
        let _ = self
            .inner
            .events
            .send(ClientEvent::Notice { level, message });
    }

    pub fn notify_success(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Success, message);
    }

    pub fn notify_error(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Error, message);
    }

    /// Routes a failed call: a 401 leaves for the login page without a
    /// notice, anything else becomes an error notice.
    pub fn report_failure(&self, err: &ClientError, notice: impl FnOnce() -> String) {
        if err.is_unauthorized() {
            self.redirect_to_login();
        } else {
            self.notify_error(notice());
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.inner.current_user.read().await.clone()
    }

    pub async fn set_current_user(&self, user: Option<User>) {
        *self.inner.current_user.write().await = user.clone();
        let _ = self.inner.events.send(ClientEvent::CurrentUserChanged(user));
    }

    pub async fn can_manage_users(&self) -> bool {
        self.inner
            .current_user
            .read()
            .await
            .as_ref()
            .is_some_and(|user| user.admin)
    }

    /// Fetches `/api/users/me` and remembers the result.
    pub async fn refresh_current_user(&self, api: &dyn AdminApi) -> ClientResult<User> {
        match api.current_user().await {
            Ok(user) => {
                info!(user_id = user.id.0, admin = user.admin, "signed in");
                self.set_current_user(Some(user.clone())).await;
                Ok(user)
            }
            Err(err) => {
                self.report_failure(&err, || {
                    format!("Failed to load current user: {}", err.server_message())
                });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
