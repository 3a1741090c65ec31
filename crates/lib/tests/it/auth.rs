//! AuthSession tests: login, bootstrap, and logout flows, plus the
//! end-to-end paths where session loss on one instance clears the auth
//! state of every instance.

use std::{sync::atomic::Ordering, time::Duration};

use chantier_hub::{
    AuthPhase, AuthSession, HubClient, LogoutBus, SessionCoordinator, SharedStorage,
    auth::Credentials,
    client::ChantierFilter,
};

use crate::helpers::{self, StubServer, TEST_EMAIL};

#[tokio::test]
async fn test_login_then_bootstrap_restores_the_session() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);
    let auth = AuthSession::new(client.clone());
    assert_eq!(auth.phase(), AuthPhase::Unknown);

    let user = auth
        .login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    assert_eq!(user.email, TEST_EMAIL);
    assert!(auth.phase().is_authenticated());

    // A new holder over the same client sees the cookie-backed session.
    let restored = AuthSession::new(client.clone());
    let user = restored
        .bootstrap()
        .await
        .expect("bootstrap should succeed");
    assert_eq!(
        user.expect("the session should be recognized").email,
        TEST_EMAIL
    );
    assert!(restored.phase().is_authenticated());
}

#[tokio::test]
async fn test_bootstrap_without_a_session_is_a_clean_no() {
    let server = StubServer::spawn().await;
    let auth = helpers::setup_session(&server);

    let user = auth.bootstrap().await.expect("bootstrap should not fail");
    assert_eq!(user, None);
    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);
}

#[tokio::test]
async fn test_wrong_credentials_are_invalid_not_expired() {
    let server = StubServer::spawn().await;
    let (client, expirations, _sub) = helpers::setup_client_with_expiry_counter(&server);
    let auth = AuthSession::new(client);

    for _ in 0..3 {
        let err = auth
            .login(&Credentials::new(TEST_EMAIL, "mauvais-mot-de-passe"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_credentials());
    }
    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);
    assert_eq!(expirations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_bootstrap_rejections_never_expire_the_session() {
    let server = StubServer::spawn().await;
    let (client, expirations, _sub) = helpers::setup_client_with_expiry_counter(&server);
    let auth = AuthSession::new(client);

    for _ in 0..5 {
        let user = auth.bootstrap().await.expect("bootstrap should not fail");
        assert_eq!(user, None);
    }
    assert_eq!(expirations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejections_on_every_auth_endpoint_never_expire_the_session() {
    let server = StubServer::spawn().await;
    let (client, expirations, _sub) = helpers::setup_client_with_expiry_counter(&server);
    let auth = AuthSession::new(client.clone());
    server.deny_auth(true);

    // Five rejections spread over the session check, login, and logout
    // endpoints.
    let user = auth.bootstrap().await.expect("bootstrap should not fail");
    assert_eq!(user, None);
    let err = auth.login(&helpers::test_credentials()).await.unwrap_err();
    assert!(err.is_invalid_credentials());
    auth.logout().await;
    let user = auth.bootstrap().await.expect("bootstrap should not fail");
    assert_eq!(user, None);
    let err = auth.login(&helpers::test_credentials()).await.unwrap_err();
    assert!(err.is_invalid_credentials());
    assert_eq!(expirations.load(Ordering::SeqCst), 0);

    // A rejected token fetch does not count either. Each create below
    // gets a 401 from the token endpoint and a 401 from the chantier
    // endpoint; only the latter feed the streak, so the notification
    // lands exactly on the second create.
    server.deny_api(true);
    let err = client
        .create_chantier(&helpers::new_chantier("Halle Tony Garnier"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(expirations.load(Ordering::SeqCst), 0);
    let err = client
        .create_chantier(&helpers::new_chantier("Halle Tony Garnier"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(expirations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_require_user_reports_not_authenticated() {
    let server = StubServer::spawn().await;
    let auth = helpers::setup_session(&server);

    let err = auth.require_user().unwrap_err();
    assert!(err.is_authentication_error());

    auth.login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    assert_eq!(auth.require_user().expect("a user is logged in").email, TEST_EMAIL);
}

#[tokio::test]
async fn test_expiry_clears_the_local_auth_state() {
    let server = StubServer::spawn().await;
    let auth = helpers::setup_session(&server);
    auth.login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    let mut phase_watch = auth.watch();

    server.deny_api(true);
    let filter = ChantierFilter::default();
    let _ = auth.client().list_chantiers(&filter).await;
    let _ = auth.client().list_chantiers(&filter).await;

    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);
    assert_eq!(auth.current_user(), None);
    tokio::time::timeout(Duration::from_secs(1), phase_watch.changed())
        .await
        .expect("the watcher should be woken")
        .expect("the session should still be alive");
}

#[tokio::test]
async fn test_a_second_expiry_does_not_wake_watchers_again() {
    let server = StubServer::spawn().await;
    let auth = helpers::setup_session(&server);
    auth.login(&helpers::test_credentials())
        .await
        .expect("login should succeed");

    server.deny_api(true);
    let filter = ChantierFilter::default();
    let _ = auth.client().list_chantiers(&filter).await;
    let _ = auth.client().list_chantiers(&filter).await;
    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);

    // Already logged out locally: another expiry must not produce a
    // transition, or a login screen could loop on redirects.
    let mut phase_watch = auth.watch();
    let _ = auth.client().list_chantiers(&filter).await;
    let _ = auth.client().list_chantiers(&filter).await;
    assert!(
        tokio::time::timeout(Duration::from_millis(100), phase_watch.changed())
            .await
            .is_err()
    );
    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);
}

#[tokio::test]
async fn test_logout_reaches_instances_sharing_storage() {
    let server = StubServer::spawn().await;
    let storage = SharedStorage::new();

    let coordinator_a = SessionCoordinator::builder().storage(&storage).build();
    let client_a = HubClient::builder(server.url())
        .coordinator(&coordinator_a)
        .build()
        .expect("client should build");
    let auth_a = AuthSession::new(client_a);

    let coordinator_b = SessionCoordinator::builder().storage(&storage).build();
    let client_b = HubClient::builder(server.url())
        .coordinator(&coordinator_b)
        .build()
        .expect("client should build");
    let auth_b = AuthSession::new(client_b);

    auth_a
        .login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    auth_b
        .login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    assert_eq!(server.active_sessions(), 2);

    let mut phase_b = auth_b.watch();
    auth_a.logout().await;
    assert_eq!(auth_a.phase(), AuthPhase::Unauthenticated);
    assert_eq!(server.active_sessions(), 1);

    tokio::time::timeout(Duration::from_secs(2), phase_b.changed())
        .await
        .expect("the other instance should hear the logout")
        .expect("the session should still be alive");
    assert_eq!(auth_b.phase(), AuthPhase::Unauthenticated);
}

#[tokio::test]
async fn test_expiry_on_one_instance_logs_out_every_instance() {
    let server = StubServer::spawn().await;
    let bus = LogoutBus::new();

    let coordinator_a = SessionCoordinator::builder().bus(&bus).build();
    let client_a = HubClient::builder(server.url())
        .coordinator(&coordinator_a)
        .build()
        .expect("client should build");
    let auth_a = AuthSession::new(client_a);

    let coordinator_b = SessionCoordinator::builder().bus(&bus).build();
    let client_b = HubClient::builder(server.url())
        .coordinator(&coordinator_b)
        .build()
        .expect("client should build");
    let auth_b = AuthSession::new(client_b);

    auth_a
        .login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    auth_b
        .login(&helpers::test_credentials())
        .await
        .expect("login should succeed");

    let mut phase_b = auth_b.watch();
    server.deny_api(true);
    let filter = ChantierFilter::default();
    let _ = auth_a.client().list_chantiers(&filter).await;
    let _ = auth_a.client().list_chantiers(&filter).await;

    assert_eq!(auth_a.phase(), AuthPhase::Unauthenticated);
    tokio::time::timeout(Duration::from_secs(2), phase_b.changed())
        .await
        .expect("the other instance should hear the expiry")
        .expect("the session should still be alive");
    assert_eq!(auth_b.phase(), AuthPhase::Unauthenticated);
}

#[tokio::test]
async fn test_expiry_crosses_instances_without_a_bus() {
    let server = StubServer::spawn().await;
    let storage = SharedStorage::new();

    let coordinator_a = SessionCoordinator::builder().storage(&storage).build();
    let client_a = HubClient::builder(server.url())
        .coordinator(&coordinator_a)
        .build()
        .expect("client should build");
    let auth_a = AuthSession::new(client_a);

    let coordinator_b = SessionCoordinator::builder().storage(&storage).build();
    let client_b = HubClient::builder(server.url())
        .coordinator(&coordinator_b)
        .build()
        .expect("client should build");
    let auth_b = AuthSession::new(client_b);

    auth_a
        .login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    auth_b
        .login(&helpers::test_credentials())
        .await
        .expect("login should succeed");

    let mut phase_b = auth_b.watch();
    server.deny_api(true);
    let filter = ChantierFilter::default();
    let _ = auth_a.client().list_chantiers(&filter).await;
    let _ = auth_a.client().list_chantiers(&filter).await;

    assert_eq!(auth_a.phase(), AuthPhase::Unauthenticated);
    tokio::time::timeout(Duration::from_secs(2), phase_b.changed())
        .await
        .expect("the other instance should hear the expiry")
        .expect("the session should still be alive");
    assert_eq!(auth_b.phase(), AuthPhase::Unauthenticated);
}

#[tokio::test]
async fn test_logout_clears_the_cached_csrf_token() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);
    let auth = AuthSession::new(client.clone());

    auth.login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    let _ = client
        .create_chantier(&helpers::new_chantier("Caserne des Sapeurs"))
        .await
        .expect("creation should succeed");
    assert_eq!(server.csrf_fetches(), 1);

    auth.logout().await;
    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);

    // A new session starts with a fresh token, not the stale one.
    auth.login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    let _ = client
        .create_chantier(&helpers::new_chantier("Caserne des Sapeurs, annexe"))
        .await
        .expect("creation should succeed");
    assert_eq!(server.csrf_fetches(), 2);
    let issued: Vec<_> = server
        .recorded_csrf_headers()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(issued, ["stub-csrf-1", "stub-csrf-2"]);
}

#[tokio::test]
async fn test_login_and_logout_send_no_csrf_header() {
    let server = StubServer::spawn().await;
    let auth = helpers::setup_session(&server);

    auth.login(&helpers::test_credentials())
        .await
        .expect("login should succeed");
    auth.logout().await;

    // Neither call fetched a token or carried the header.
    assert_eq!(server.csrf_fetches(), 0);
    assert_eq!(server.recorded_csrf_headers(), vec![None, None]);
}
