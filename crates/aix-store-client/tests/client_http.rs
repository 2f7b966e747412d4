//! HTTP-level tests for StoreClient against a mock server

use aix_store_client::{Query, RemoteStore, StoreClient, StoreConfig, StoreError};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-test-key";

fn client_for(server: &MockServer) -> StoreClient {
    StoreClient::new(StoreConfig {
        base_url: server.uri(),
        anon_key: Some(ANON_KEY.to_string()),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_select_sends_filters_and_anon_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/comments"))
        .and(query_param("target_id", "eq.a-42"))
        .and(query_param("order", "created_at.asc"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer anon-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c1", "target_id": "a-42", "text": "Mantap"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rows = client
        .select("comments", &Query::new().eq("target_id", "a-42").order_asc("created_at"))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["text"], "Mantap");
}

#[tokio::test]
async fn test_sign_in_switches_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_json(json!({"email": "rina@1aix.id", "password": "rahasia"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "user-token",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "user": {"id": "u-1", "email": "rina@1aix.id", "user_metadata": {"full_name": "Rina"}}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/comments"))
        .and(header("authorization", "Bearer user-token"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "c9", "text": "Halo"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = client
        .sign_in_with_password("rina@1aix.id", "rahasia")
        .await
        .unwrap();
    assert_eq!(session.user.display_name(), "Rina");

    let row = client
        .insert("comments", json!({"text": "Halo"}))
        .await
        .unwrap();
    assert_eq!(row["id"], "c9");
}

#[tokio::test]
async fn test_sign_in_rejection_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .sign_in_with_password("x@1aix.id", "salah")
        .await
        .unwrap_err();
    match err {
        StoreError::Auth(message) => assert_eq!(message, "Invalid login credentials"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_upsert_uses_conflict_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/product_votes"))
        .and(query_param("on_conflict", "target_id"))
        .and(header_exists("prefer"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"target_id": "p-1", "likes": 4, "dislikes": 1}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let row = client
        .upsert(
            "product_votes",
            json!({"target_id": "p-1", "likes": 4, "dislikes": 1}),
            "target_id",
        )
        .await
        .unwrap();
    assert_eq!(row["likes"], 4);
}

#[tokio::test]
async fn test_server_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/smartphones"))
        .and(query_param("id", "eq.p-3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .update("smartphones", json!({"order_rank": 2}), &Query::new().eq("id", "p-3"))
        .await
        .unwrap_err();

    assert!(err.is_server_fault());
    match err {
        StoreError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_counts_returned_rows() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/bookmarks"))
        .and(query_param("user_id", "eq.u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let removed = client
        .delete("bookmarks", &Query::new().eq("user_id", "u-1"))
        .await
        .unwrap();
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn test_failed_sign_out_still_drops_user_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "user-token",
            "user": {"id": "u-1", "email": "rina@1aix.id"}
        })))
        .mount(&server)
        .await;

    // Logout outlives the client timeout
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/smartphones"))
        .and(header("authorization", "Bearer anon-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = StoreClient::new(StoreConfig {
        base_url: server.uri(),
        anon_key: Some(ANON_KEY.to_string()),
        timeout_secs: 1,
    })
    .unwrap();
    client
        .sign_in_with_password("rina@1aix.id", "rahasia")
        .await
        .unwrap();

    let err = client.sign_out().await.unwrap_err();
    assert!(matches!(err, StoreError::Http(_)));

    let rows = client.select("smartphones", &Query::new()).await.unwrap();
    assert!(rows.is_empty());
}
