use shared::{domain::UserId, protocol::User};

use super::*;
use crate::test_support::{
    drain_notices, shortcut, test_context, Failure, FakeAdminApi, RecordingNavigator,
};

#[test]
fn api_paths_hang_off_the_root() {
    let endpoints = Endpoints::new("https://admin.dxe.io", "https://dxe.io/").expect("endpoints");
    assert_eq!(
        endpoints.api("shortcuts").expect("url").as_str(),
        "https://admin.dxe.io/api/shortcuts"
    );
    assert_eq!(
        endpoints.api("shortcuts/").expect("url").as_str(),
        "https://admin.dxe.io/api/shortcuts/"
    );
    assert_eq!(endpoints.login_url(), "https://admin.dxe.io/auth/login");
    assert_eq!(endpoints.logout_url(), "https://admin.dxe.io/auth/logout");
}

#[test]
fn root_with_path_keeps_its_prefix() {
    let endpoints = Endpoints::new("http://localhost:8080/shorty", "https://dxe.io/")
        .expect("endpoints");
    assert_eq!(endpoints.root().as_str(), "http://localhost:8080/shorty/");
    assert_eq!(
        endpoints.api("users/me").expect("url").as_str(),
        "http://localhost:8080/shorty/api/users/me"
    );
    assert_eq!(endpoints.login_url(), "http://localhost:8080/shorty/auth/login");
}

#[test]
fn rejects_unparseable_root() {
    let err = Endpoints::new("not a url", "https://dxe.io/").expect_err("must fail");
    assert!(matches!(err, ClientError::InvalidEndpoint(_)));
}

#[test]
fn share_link_appends_code() {
    let (ctx, _navigator) = test_context();
    assert_eq!(ctx.share_link("donate"), "https://dxe.io/donate");
}

#[test]
fn only_user_views_require_admin() {
    assert!(Route::Users.requires_admin());
    assert!(Route::NewUser.requires_admin());
    assert!(Route::EditUser(User::default()).requires_admin());
    assert!(!Route::Shortcuts.requires_admin());
    assert!(!Route::EditShortcut(shortcut(1, "a")).requires_admin());
    assert!(!Route::Visits.requires_admin());
    assert_eq!(Route::NewUser.path(), "/new_user");
}

#[test]
fn logout_leaves_for_the_auth_gateway() {
    let (ctx, navigator) = test_context();
    ctx.logout();
    assert_eq!(navigator.redirects(), vec!["http://admin.test/auth/logout"]);
    assert!(navigator.routes().is_empty());
}

#[test]
fn report_failure_separates_unauthorized_from_errors() {
    let (ctx, navigator) = test_context();
    let mut events = ctx.subscribe_events();

    ctx.report_failure(&ClientError::Unauthorized, || "unused".to_string());
    let err = ClientError::Api(shared::error::ApiError::new(500, "boom"));
    ctx.report_failure(&err, || format!("Failed: {}", err.server_message()));

    assert_eq!(navigator.redirects(), vec!["http://admin.test/auth/login"]);
    assert_eq!(
        drain_notices(&mut events),
        vec![(NoticeLevel::Error, "Failed: boom".to_string())]
    );
}

#[tokio::test]
async fn refresh_current_user_gates_user_management() {
    let mut admin = User::new("Ada", "ada@example.org");
    admin.id = UserId(1);
    admin.admin = true;
    let api = FakeAdminApi::new(Ok(Default::default()), Ok(admin.clone()));
    let (ctx, _navigator) = test_context();
    let mut events = ctx.subscribe_events();

    assert!(!ctx.can_manage_users().await);
    let me = ctx.refresh_current_user(api.as_ref()).await.expect("me");

    assert_eq!(me, admin);
    assert!(ctx.can_manage_users().await);
    assert_eq!(ctx.current_user().await, Some(admin.clone()));
    assert_eq!(
        events.try_recv().expect("event"),
        ClientEvent::CurrentUserChanged(Some(admin))
    );
}

#[tokio::test]
async fn non_admin_cannot_manage_users() {
    let api = FakeAdminApi::new(
        Ok(Default::default()),
        Ok(User::new("Bob", "bob@example.org")),
    );
    let (ctx, _navigator) = test_context();
    ctx.refresh_current_user(api.as_ref()).await.expect("me");
    assert!(!ctx.can_manage_users().await);
}

#[tokio::test]
async fn refresh_without_session_redirects() {
    let api = FakeAdminApi::new(Ok(Default::default()), Err(Failure::Unauthorized));
    let navigator = std::sync::Arc::new(RecordingNavigator::default());
    let endpoints = Endpoints::new("http://admin.test", "https://dxe.io/").expect("endpoints");
    let ctx = AppContext::new(endpoints, navigator.clone());

    let err = ctx
        .refresh_current_user(api.as_ref())
        .await
        .expect_err("must fail");

    assert!(err.is_unauthorized());
    assert_eq!(ctx.current_user().await, None);
    assert_eq!(navigator.redirects(), vec!["http://admin.test/auth/login"]);
}
