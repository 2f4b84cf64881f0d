//! Session bootstrap, login and logout behaviour against a scripted backend
use bidi_session::models::UserProfile;
use bidi_session::testing::constants::{TEST_EMAIL, TEST_PASSWORD};
use bidi_session::testing::{mint_token, token_for_role, MockBackend, TestSession};
use bidi_session::{
    BackendError, Credentials, GuardDecision, LoginError, Notice, Role, RouteGuard, Screen,
    SessionPhase,
};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

fn credentials() -> Credentials {
    Credentials::new(TEST_EMAIL, TEST_PASSWORD)
}

#[tokio::test]
async fn test_undecodable_tokens_end_logged_out_with_store_cleared() {
    let not_json = "eyJhbGciOiJIUzI1NiJ9.bm90IGpzb24.c2ln";
    let array_payload = mint_token(&json!(["OMC_ADMIN"]));
    let unknown_role = mint_token(&json!({"role": "SUPER_ADMIN"}));

    for token in [
        "garbage",
        "a.b",
        "a.!!!.c",
        not_json,
        array_payload.as_str(),
        unknown_role.as_str(),
    ] {
        let harness = TestSession::with_token(token, MockBackend::new());

        let phase = harness.context.bootstrap().await;

        assert_eq!(phase, SessionPhase::Unauthenticated, "token {token:?}");
        assert_eq!(harness.store.peek(), None, "token {token:?}");
        assert_eq!(harness.backend.total_calls(), 0, "token {token:?}");
        assert!(!harness.context.is_loading());
        assert!(harness.notifier.notices().is_empty());
    }
}

#[tokio::test]
async fn test_rejected_token_clears_store_and_notifies_once() {
    let harness = TestSession::with_token(
        token_for_role("OMC_ADMIN"),
        MockBackend::new().with_validate(Err(BackendError::TokenRejected)),
    );

    let phase = harness.context.bootstrap().await;

    assert_eq!(phase, SessionPhase::Unauthenticated);
    assert_eq!(harness.store.peek(), None);
    assert_eq!(harness.context.role(), None);
    assert_eq!(harness.notifier.count(&Notice::SessionExpired), 1);
    assert_eq!(harness.notifier.notices().len(), 1);
    // Rejection short-circuits before the profile round-trip
    assert_eq!(harness.backend.profile_calls(), 0);
}

#[tokio::test]
async fn test_network_failure_during_validation_fails_safe() {
    let harness = TestSession::with_token(
        token_for_role("STATION_MANAGER"),
        MockBackend::new().with_validate(Err(BackendError::Network("connection refused".into()))),
    );

    assert_eq!(
        harness.context.bootstrap().await,
        SessionPhase::Unauthenticated
    );
    assert_eq!(harness.store.peek(), None);
    assert_eq!(harness.notifier.notices(), vec![Notice::SessionExpired]);
}

#[tokio::test]
async fn test_profile_failure_keeps_decoded_role() {
    let token = token_for_role("PUMP_ATTENDANT");
    let harness = TestSession::with_token(
        token.clone(),
        MockBackend::new().with_profile(Err(BackendError::Network("timed out".into()))),
    );

    assert_eq!(
        harness.context.bootstrap().await,
        SessionPhase::Authenticated(Role::PumpAttendant)
    );
    assert_eq!(harness.store.peek(), Some(token));
    assert!(harness.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_profile_role_supersedes_decoded_role() {
    let harness = TestSession::with_token(
        token_for_role("OMC_ADMIN"),
        MockBackend::new().with_profile_role("STATION_MANAGER"),
    );

    assert_eq!(
        harness.context.bootstrap().await,
        SessionPhase::Authenticated(Role::StationManager)
    );
    assert_eq!(harness.context.role(), Some(Role::StationManager));
    assert_eq!(harness.backend.validate_calls(), 1);
    assert_eq!(harness.backend.profile_calls(), 1);
}

#[tokio::test]
async fn test_absent_token_makes_no_network_calls() {
    let harness = TestSession::new(MockBackend::new());

    assert_eq!(
        harness.context.bootstrap().await,
        SessionPhase::Unauthenticated
    );
    assert_eq!(harness.backend.total_calls(), 0);
}

#[tokio::test]
async fn test_optimistic_role_is_visible_while_validating() {
    let harness = TestSession::with_token(token_for_role("OMC_ADMIN"), MockBackend::new());
    let gate = harness.backend.hold_validation();

    let context = harness.context.clone();
    let bootstrap = tokio::spawn(async move { context.bootstrap().await });
    gate.entered().await;

    let state = harness.context.snapshot();
    assert_eq!(state.phase, SessionPhase::Bootstrapping);
    assert_eq!(state.role, Some(Role::OmcAdmin));
    assert!(state.is_loading);

    gate.release();
    assert_eq!(
        bootstrap.await.unwrap(),
        SessionPhase::Authenticated(Role::OmcAdmin)
    );
    assert!(!harness.context.is_loading());
}

#[tokio::test]
async fn test_login_persists_token_and_authenticates() {
    let harness = TestSession::new(MockBackend::new().with_login_role("PUMP_ATTENDANT"));
    harness.context.bootstrap().await;

    let role = harness.context.login(&credentials()).await.unwrap();

    assert_eq!(role, Role::PumpAttendant);
    assert_eq!(
        harness.context.phase(),
        SessionPhase::Authenticated(Role::PumpAttendant)
    );
    assert!(harness.store.peek().is_some());
    assert_eq!(harness.context.current_token(), harness.store.peek());
    assert_eq!(harness.notifier.notices(), vec![Notice::LoginSucceeded]);
}

#[tokio::test]
async fn test_login_with_unrecognised_role_is_rejected() {
    let harness = TestSession::new(MockBackend::new().with_login_role("SUPER_ADMIN"));
    harness.context.bootstrap().await;

    let err = harness.context.login(&credentials()).await.unwrap_err();

    assert!(matches!(err, LoginError::UnauthorizedRole(Some(ref role)) if role == "SUPER_ADMIN"));
    assert_eq!(harness.store.peek(), None);
    assert_eq!(harness.context.phase(), SessionPhase::Unauthenticated);
    assert_eq!(harness.notifier.notices(), vec![Notice::AccessDenied]);
}

#[tokio::test]
async fn test_invalid_credentials_surface_backend_message() {
    let harness = TestSession::new(MockBackend::new().with_login(Err(
        BackendError::InvalidCredentials("Invalid email or password".into()),
    )));
    harness.context.bootstrap().await;

    let err = harness.context.login(&credentials()).await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password");
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::LoginFailed("Invalid email or password".into())]
    );
    assert_eq!(harness.context.phase(), SessionPhase::Unauthenticated);
}

#[tokio::test]
async fn test_login_shows_loading_while_in_flight() {
    let harness = TestSession::new(MockBackend::new().with_login(Err(
        BackendError::InvalidCredentials("nope".into()),
    )));
    harness.context.bootstrap().await;
    let gate = harness.backend.hold_login();

    let context = harness.context.clone();
    let login = tokio::spawn(async move { context.login(&credentials()).await });
    gate.entered().await;
    assert!(harness.context.is_loading());

    gate.release();
    assert!(login.await.unwrap().is_err());
    assert!(!harness.context.is_loading());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let token = token_for_role("OMC_ADMIN");
    let harness = TestSession::with_token(token.clone(), MockBackend::new());
    harness.context.bootstrap().await;

    let notification = harness.context.logout().expect("token was stored");
    notification.await.unwrap();
    let after_first = harness.context.snapshot();
    assert!(harness.context.logout().is_none());

    assert_eq!(harness.context.snapshot(), after_first);
    assert_eq!(after_first.phase, SessionPhase::Unauthenticated);
    assert_eq!(harness.store.peek(), None);
    assert_eq!(harness.backend.logout_tokens(), vec![token]);
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::LoggedOut, Notice::NavigateToLogin]
    );
}

#[tokio::test]
async fn test_logout_notification_failure_is_swallowed() {
    let harness = TestSession::with_token(
        token_for_role("STATION_MANAGER"),
        MockBackend::new().with_logout(Err(BackendError::Network("offline".into()))),
    );
    harness.context.bootstrap().await;

    let notification = harness.context.logout().expect("token was stored");
    notification.await.unwrap();

    assert_eq!(harness.context.phase(), SessionPhase::Unauthenticated);
    assert_eq!(harness.store.peek(), None);
    assert_eq!(harness.backend.logout_calls(), 1);
    assert_eq!(harness.notifier.count(&Notice::LoggedOut), 1);
}

#[tokio::test]
async fn test_logout_does_not_wait_for_backend() {
    let token = token_for_role("OMC_ADMIN");
    let harness = TestSession::with_token(token.clone(), MockBackend::new());
    harness.context.bootstrap().await;
    let gate = harness.backend.hold_logout();

    let notification = harness.context.logout().expect("token was stored");

    // Everything local has happened while the backend call is still pending
    assert_eq!(harness.context.phase(), SessionPhase::Unauthenticated);
    assert_eq!(harness.store.peek(), None);
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::LoggedOut, Notice::NavigateToLogin]
    );
    gate.entered().await;
    assert!(!notification.is_finished());

    gate.release();
    notification.await.unwrap();
    assert_eq!(harness.backend.logout_tokens(), vec![token]);
}

#[tokio::test]
async fn test_logout_notifies_backend_with_current_token() {
    let harness = TestSession::with_token(
        token_for_role("OMC_ADMIN"),
        MockBackend::new().with_login_role("PUMP_ATTENDANT"),
    );
    let gate = harness.backend.hold_validation();

    let context = harness.context.clone();
    let bootstrap = tokio::spawn(async move { context.bootstrap().await });
    gate.entered().await;
    harness.context.login(&credentials()).await.unwrap();
    let fresh_token = harness.store.peek().unwrap();

    let notification = harness.context.logout().expect("token was stored");
    notification.await.unwrap();
    gate.release();
    bootstrap.await.unwrap();

    assert_eq!(harness.backend.logout_tokens(), vec![fresh_token]);
    assert_eq!(harness.context.phase(), SessionPhase::Unauthenticated);
}

#[tokio::test]
async fn test_cancelled_bootstrap_settles_logged_out_and_can_rerun() {
    let token = token_for_role("OMC_ADMIN");
    let harness = TestSession::with_token(token.clone(), MockBackend::new());
    let gate = harness.backend.hold_validation();
    let guard = RouteGuard::new(harness.context.subscribe());

    let timed_out = timeout(Duration::from_millis(50), harness.context.bootstrap()).await;
    assert!(timed_out.is_err());

    let state = harness.context.snapshot();
    assert_eq!(state.phase, SessionPhase::Unauthenticated);
    assert_eq!(state.role, None);
    assert!(!state.is_loading);
    assert_eq!(harness.store.peek(), Some(token));
    assert_eq!(
        guard.decide(Screen::Dashboard),
        GuardDecision::Redirect { to: Screen::Login }
    );

    gate.release();
    assert_eq!(
        harness.context.bootstrap().await,
        SessionPhase::Authenticated(Role::OmcAdmin)
    );
    assert!(guard.decide(Screen::Dashboard).is_render());
}

#[tokio::test]
async fn test_logout_during_profile_fetch_is_not_resurrected() {
    let harness = TestSession::with_token(
        token_for_role("OMC_ADMIN"),
        MockBackend::new().with_profile_role("STATION_MANAGER"),
    );
    let gate = harness.backend.hold_profile();

    let context = harness.context.clone();
    let bootstrap = tokio::spawn(async move { context.bootstrap().await });
    gate.entered().await;

    harness.context.logout();
    gate.release();

    assert_eq!(bootstrap.await.unwrap(), SessionPhase::Unauthenticated);
    let state = harness.context.snapshot();
    assert_eq!(state.role, None);
    assert!(!state.is_loading);
    assert_eq!(harness.store.peek(), None);
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::LoggedOut, Notice::NavigateToLogin]
    );
}

#[tokio::test]
async fn test_stale_validation_failure_does_not_notify() {
    let harness = TestSession::with_token(
        token_for_role("OMC_ADMIN"),
        MockBackend::new().with_validate(Err(BackendError::TokenRejected)),
    );
    let gate = harness.backend.hold_validation();

    let context = harness.context.clone();
    let bootstrap = tokio::spawn(async move { context.bootstrap().await });
    gate.entered().await;

    harness.context.logout();
    gate.release();
    bootstrap.await.unwrap();

    assert_eq!(harness.notifier.count(&Notice::SessionExpired), 0);
    assert_eq!(harness.context.phase(), SessionPhase::Unauthenticated);
}

#[tokio::test]
async fn test_login_supersedes_pending_bootstrap() {
    let harness = TestSession::with_token(
        token_for_role("OMC_ADMIN"),
        MockBackend::new()
            .with_validate(Err(BackendError::TokenRejected))
            .with_login_role("STATION_MANAGER"),
    );
    let gate = harness.backend.hold_validation();

    let context = harness.context.clone();
    let bootstrap = tokio::spawn(async move { context.bootstrap().await });
    gate.entered().await;

    harness.context.login(&credentials()).await.unwrap();
    let fresh_token = harness.store.peek();
    gate.release();
    bootstrap.await.unwrap();

    assert_eq!(
        harness.context.phase(),
        SessionPhase::Authenticated(Role::StationManager)
    );
    assert_eq!(harness.store.peek(), fresh_token);
    assert_eq!(harness.notifier.count(&Notice::SessionExpired), 0);
}

#[tokio::test]
async fn test_teardown_discards_in_flight_results() {
    let harness = TestSession::with_token(
        token_for_role("OMC_ADMIN"),
        MockBackend::new().with_validate(Err(BackendError::TokenRejected)),
    );
    let gate = harness.backend.hold_validation();

    let context = harness.context.clone();
    let bootstrap = tokio::spawn(async move { context.bootstrap().await });
    gate.entered().await;
    let before = harness.context.snapshot();

    harness.context.teardown();
    gate.release();
    bootstrap.await.unwrap();

    assert_eq!(harness.context.snapshot(), before);
    assert!(harness.store.peek().is_some());
    assert!(harness.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_unrecognised_profile_role_after_change_forces_logout() {
    let harness = TestSession::with_token(token_for_role("OMC_ADMIN"), MockBackend::new());
    harness.context.bootstrap().await;

    harness.backend.set_profile(Ok(UserProfile {
        role: Some("REGIONAL_AUDITOR".into()),
        ..UserProfile::default()
    }));

    assert_eq!(
        harness.context.refresh_profile().await,
        SessionPhase::Unauthenticated
    );
    assert_eq!(harness.store.peek(), None);
    assert_eq!(harness.notifier.notices(), vec![Notice::SessionExpired]);
}

#[tokio::test]
async fn test_subscribers_observe_resolution() {
    let harness = TestSession::with_token(token_for_role("PUMP_ATTENDANT"), MockBackend::new());
    let mut updates = harness.context.subscribe();
    assert!(updates.borrow_and_update().is_loading);

    harness.context.bootstrap().await;

    assert!(updates.has_changed().unwrap());
    let state = updates.borrow_and_update().clone();
    assert_eq!(state.phase, SessionPhase::Authenticated(Role::PumpAttendant));
}
