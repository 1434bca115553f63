//! HTTP identity client against a local stand-in for the auth service.

use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use diploma_identity::{HttpIdentityClient, IdentityError, IdentityResolver, WalletDirectory};

async fn profile(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    match auth {
        "Bearer alice" => Ok(Json(json!({"id": "u-alice", "address": "0xAbC0000000000000000000000000000000000001"}))),
        "Bearer bob" => Ok(Json(json!({"sub": "u-bob", "walletAddress": "0x0000000000000000000000000000000000000b0b"}))),
        "Bearer empty" => Ok(Json(json!({"name": "nobody"}))),
        "Bearer boom" => Err(StatusCode::INTERNAL_SERVER_ERROR),
        "Bearer slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Json(json!({"id": "late"})))
        }
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn wallet(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    match id.as_str() {
        "u-alice" => Ok(Json(json!({"walletAddress": "0xabc0000000000000000000000000000000000001"}))),
        "u-broken" => Err(StatusCode::BAD_GATEWAY),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn admin_wallet() -> Json<Value> {
    Json(json!({"walletAddress": "0x00000000000000000000000000000000000000ad"}))
}

async fn spawn_auth_service() -> String {
    let app = Router::new()
        .route("/auth/profile", get(profile))
        .route("/users/:id/wallet", get(wallet))
        .route("/admin/wallet", get(admin_wallet));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn resolves_address_and_id() {
    let client = HttpIdentityClient::new(spawn_auth_service().await);
    let resolved = client.resolve_identity("alice").await.unwrap();
    assert_eq!(resolved.user_id.as_deref(), Some("u-alice"));
    assert_eq!(
        resolved.wallet_address.as_deref(),
        Some("0xAbC0000000000000000000000000000000000001")
    );
}

#[tokio::test]
async fn accepts_alternate_field_names() {
    let client = HttpIdentityClient::new(spawn_auth_service().await);
    let resolved = client.resolve_identity("bob").await.unwrap();
    assert_eq!(resolved.user_id.as_deref(), Some("u-bob"));
    assert!(resolved.wallet_address.is_some());
}

#[tokio::test]
async fn refused_token_is_unauthenticated() {
    let client = HttpIdentityClient::new(spawn_auth_service().await);
    let err = client.resolve_identity("mallory").await.unwrap_err();
    assert!(matches!(err, IdentityError::Unauthenticated(_)));
}

#[tokio::test]
async fn profile_without_identity_is_unauthenticated() {
    let client = HttpIdentityClient::new(spawn_auth_service().await);
    let err = client.resolve_identity("empty").await.unwrap_err();
    assert!(matches!(err, IdentityError::Unauthenticated(_)));
}

#[tokio::test]
async fn server_error_is_upstream_unavailable() {
    let client = HttpIdentityClient::new(spawn_auth_service().await);
    let err = client.resolve_identity("boom").await.unwrap_err();
    assert!(matches!(err, IdentityError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn timeout_is_upstream_unavailable() {
    let base = spawn_auth_service().await;
    let client = HttpIdentityClient::with_timeout(base, Duration::from_millis(200));
    let err = client.resolve_identity("slow").await.unwrap_err();
    assert!(matches!(err, IdentityError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn unreachable_service_is_upstream_unavailable() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = HttpIdentityClient::new(format!("http://{addr}"));
    let err = client.resolve_identity("alice").await.unwrap_err();
    assert!(matches!(err, IdentityError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn wallet_directory_lookups() {
    let client = HttpIdentityClient::new(spawn_auth_service().await);
    assert_eq!(
        client.resolve_wallet("u-alice").await.unwrap(),
        "0xabc0000000000000000000000000000000000001"
    );
    assert!(matches!(
        client.resolve_wallet("u-ghost").await.unwrap_err(),
        IdentityError::UnknownUser(_)
    ));
    assert!(matches!(
        client.resolve_wallet("u-broken").await.unwrap_err(),
        IdentityError::UpstreamUnavailable(_)
    ));
}

#[tokio::test]
async fn user_id_cannot_escape_the_wallet_path() {
    let client = HttpIdentityClient::new(spawn_auth_service().await);
    for user_id in ["../admin", "../../admin", "u-alice?x=1", "u-alice#x", "u-alice/../../admin"] {
        let err = client.resolve_wallet(user_id).await.unwrap_err();
        assert!(matches!(err, IdentityError::UnknownUser(_)), "{user_id}: {err:?}");
    }
}
