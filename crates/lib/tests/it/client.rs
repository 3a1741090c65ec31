//! HubClient tests against the stub API server: the unauthorized-streak
//! heuristic, CSRF handling, and error mapping.

use std::sync::atomic::Ordering;

use chantier_hub::{
    HubClient, SessionCoordinator,
    client::{ChantierFilter, ChantierStatut, ChantierUpdate},
};
use uuid::Uuid;

use crate::helpers::{self, StubServer};

#[tokio::test]
async fn test_health_reports_a_healthy_server() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);

    let health = client.health().await.expect("health should respond");
    assert!(health.is_healthy());
}

#[tokio::test]
async fn test_list_chantiers_decodes_the_page() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);

    let page = client
        .list_chantiers(&ChantierFilter::default())
        .await
        .expect("listing should succeed");
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].nom, "Résidence Les Tilleuls");
}

#[tokio::test]
async fn test_get_chantier_returns_the_seeded_site() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);

    let expected = helpers::les_tilleuls();
    let chantier = client
        .get_chantier(expected.id)
        .await
        .expect("lookup should succeed");
    assert_eq!(chantier, expected);
}

#[tokio::test]
async fn test_missing_chantier_maps_to_not_found() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);

    let err = client.get_chantier(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_update_chantier_applies_partial_changes() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);

    let update = ChantierUpdate {
        statut: Some(ChantierStatut::Receptionne),
        ..Default::default()
    };
    let updated = client
        .update_chantier(helpers::les_tilleuls().id, &update)
        .await
        .expect("update should succeed");
    assert_eq!(updated.statut, ChantierStatut::Receptionne);
    assert_eq!(updated.nom, helpers::les_tilleuls().nom);
}

#[tokio::test]
async fn test_two_consecutive_unauthorized_responses_expire_the_session() {
    let server = StubServer::spawn().await;
    let (client, expirations, _sub) = helpers::setup_client_with_expiry_counter(&server);
    server.deny_api(true);

    let filter = ChantierFilter::default();
    let first = client.list_chantiers(&filter).await.unwrap_err();
    assert!(first.is_unauthorized());
    assert_eq!(expirations.load(Ordering::SeqCst), 0);

    let second = client.list_chantiers(&filter).await.unwrap_err();
    assert!(second.is_unauthorized());
    assert_eq!(expirations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_the_streak_rearms_after_firing() {
    let server = StubServer::spawn().await;
    let (client, expirations, _sub) = helpers::setup_client_with_expiry_counter(&server);
    server.deny_api(true);

    let filter = ChantierFilter::default();
    for _ in 0..4 {
        let _ = client.list_chantiers(&filter).await;
    }
    assert_eq!(expirations.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_a_success_resets_the_streak() {
    let server = StubServer::spawn().await;
    let (client, expirations, _sub) = helpers::setup_client_with_expiry_counter(&server);
    let filter = ChantierFilter::default();

    server.deny_api(true);
    let _ = client.list_chantiers(&filter).await;
    server.deny_api(false);
    client
        .list_chantiers(&filter)
        .await
        .expect("listing should succeed again");
    server.deny_api(true);
    let _ = client.list_chantiers(&filter).await;
    assert_eq!(expirations.load(Ordering::SeqCst), 0);

    let _ = client.list_chantiers(&filter).await;
    assert_eq!(expirations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_non_unauthorized_failures_leave_the_streak_untouched() {
    let server = StubServer::spawn().await;
    let (client, expirations, _sub) = helpers::setup_client_with_expiry_counter(&server);
    let filter = ChantierFilter::default();

    server.deny_api(true);
    let _ = client.list_chantiers(&filter).await;

    // A 404 in between neither resets nor extends the streak.
    server.deny_api(false);
    let missing = client.get_chantier(Uuid::new_v4()).await.unwrap_err();
    assert!(missing.is_not_found());
    assert_eq!(expirations.load(Ordering::SeqCst), 0);

    server.deny_api(true);
    let _ = client.list_chantiers(&filter).await;
    assert_eq!(expirations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_the_failure_threshold_is_configurable() {
    let server = StubServer::spawn().await;
    let coordinator = SessionCoordinator::builder().build();
    let client = HubClient::builder(server.url())
        .coordinator(&coordinator)
        .failure_threshold(1)
        .build()
        .expect("client should build");
    let (expirations, _sub) = helpers::expiry_counter(&coordinator);

    server.deny_api(true);
    let _ = client.list_chantiers(&ChantierFilter::default()).await;
    assert_eq!(expirations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clones_share_the_unauthorized_streak() {
    let server = StubServer::spawn().await;
    let (client, expirations, _sub) = helpers::setup_client_with_expiry_counter(&server);
    let clone = client.clone();
    server.deny_api(true);

    let filter = ChantierFilter::default();
    let _ = client.list_chantiers(&filter).await;
    let _ = clone.list_chantiers(&filter).await;
    assert_eq!(expirations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_mutating_requests_carry_the_csrf_header() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);

    let created = client
        .create_chantier(&helpers::new_chantier("Halle Tony Garnier"))
        .await
        .expect("creation should succeed");
    assert_eq!(created.nom, "Halle Tony Garnier");

    assert_eq!(server.csrf_fetches(), 1);
    assert_eq!(
        server.recorded_csrf_headers(),
        vec![Some("stub-csrf-1".to_string())]
    );
}

#[tokio::test]
async fn test_the_csrf_token_is_fetched_once_and_reused() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);

    let created = client
        .create_chantier(&helpers::new_chantier("Passerelle des Docks"))
        .await
        .expect("creation should succeed");
    let update = ChantierUpdate {
        statut: Some(ChantierStatut::EnCours),
        ..Default::default()
    };
    let _ = client
        .update_chantier(helpers::les_tilleuls().id, &update)
        .await
        .expect("update should succeed");
    client
        .delete_chantier(created.id)
        .await
        .expect("deletion should succeed");

    assert_eq!(server.csrf_fetches(), 1);
    let headers = server.recorded_csrf_headers();
    assert_eq!(headers.len(), 3);
    assert!(
        headers
            .iter()
            .all(|h| h.as_deref() == Some("stub-csrf-1"))
    );
}

#[tokio::test]
async fn test_read_requests_never_fetch_a_csrf_token() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);

    client.health().await.expect("health should respond");
    client
        .list_chantiers(&ChantierFilter::default())
        .await
        .expect("listing should succeed");
    assert_eq!(server.csrf_fetches(), 0);
}

#[tokio::test]
async fn test_a_failed_token_fetch_proceeds_without_the_header() {
    let server = StubServer::spawn().await;
    let client = helpers::setup_client(&server);
    server.deny_csrf(true);

    let created = client
        .create_chantier(&helpers::new_chantier("Gymnase du Parc"))
        .await
        .expect("the request should still go out");
    assert_eq!(created.nom, "Gymnase du Parc");
    assert_eq!(server.recorded_csrf_headers(), vec![None]);

    // The failure is not cached: the next mutation fetches a token.
    server.deny_csrf(false);
    let _ = client
        .create_chantier(&helpers::new_chantier("Gymnase du Parc, tranche 2"))
        .await
        .expect("creation should succeed");
    assert_eq!(server.csrf_fetches(), 1);
    assert_eq!(
        server.recorded_csrf_headers().last(),
        Some(&Some("stub-csrf-1".to_string()))
    );
}

#[tokio::test]
async fn test_connection_refused_is_a_network_error() {
    // A high port that is unlikely to be in use.
    let client = HubClient::builder("http://127.0.0.1:59999")
        .build()
        .expect("client should build");
    let (expirations, _sub) = helpers::expiry_counter(client.coordinator());

    let err = client.health().await.unwrap_err();
    assert!(err.is_network_error());

    let err = client.health().await.unwrap_err();
    assert!(err.is_network_error());
    assert_eq!(expirations.load(Ordering::SeqCst), 0);
}
