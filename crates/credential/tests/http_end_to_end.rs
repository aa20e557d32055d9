//! End-to-end tests through the HTTP client against a mock Atlas server

mod common;

use atlas_credential::HttpClientFactory;
use atlas_credential::prelude::*;
use atlas_credential::session::USER_AGENT;
use common::{READ_STATEMENT, config, init_tracing, issue};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const CHALLENGE: &str = r#"Digest realm="MMS Public API", domain="", nonce="4a1f0b3c9d2e8f7a6b5c", algorithm=MD5, qop="auth", stale=false"#;

fn unauthenticated(req: &Request) -> bool {
    !req.headers.contains_key("authorization")
}

async fn atlas() -> (MockServer, AtlasDatabase) {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(unauthenticated)
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", CHALLENGE))
        .mount(&server)
        .await;

    let factory =
        HttpClientFactory::new().with_base_url(format!("{}/api/atlas/v1.0/", server.uri()));
    let db = AtlasDatabase::with_factory(factory);
    db.initialize(InitializeRequest::new(config())).await.unwrap();
    (server, db)
}

#[tokio::test]
async fn test_issue_and_revoke_over_http() {
    // GIVEN: A digest-protected Atlas accepting create and delete
    let (server, db) = atlas().await;
    Mock::given(method("POST"))
        .and(path("/api/atlas/v1.0/groups/p1/databaseUsers"))
        .and(header_exists("authorization"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "username": "created",
            "databaseName": "admin",
            "groupId": "p1",
            "roles": [{"databaseName": "admin", "roleName": "read"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/api/atlas/v1\.0/groups/p1/databaseUsers/admin/v-test-[A-Za-z0-9]+$"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    // WHEN: Issuing then revoking a user
    let response = db.new_user(issue("test", &[READ_STATEMENT])).await.unwrap();
    db.delete_user(DeleteUserRequest::new(response.username.clone()))
        .await
        .unwrap();

    // THEN: The create body carried the generated name and provided password
    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.headers.contains_key("authorization"))
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
    assert_eq!(
        body,
        json!({
            "username": response.username,
            "password": "Pa55-word-from-host",
            "databaseName": "admin",
            "roles": [{"databaseName": "admin", "roleName": "read"}]
        })
    );

    let authorization = create
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(authorization.starts_with("Digest "), "{authorization}");
    assert!(authorization.contains(r#"username="pub-key""#), "{authorization}");
    assert!(!authorization.contains("priv-key"));
}

#[tokio::test]
async fn test_update_password_over_http() {
    let (server, db) = atlas().await;
    Mock::given(method("PATCH"))
        .and(path("/api/atlas/v1.0/groups/p1/databaseUsers/admin/v-test-user"))
        .and(header_exists("authorization"))
        .and(body_json(json!({"password": "rotated-pass"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "v-test-user",
            "databaseName": "admin",
            "roles": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    db.update_user(UpdateUserRequest::new("v-test-user").with_password("rotated-pass"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_atlas_error_reaches_caller() {
    let (server, db) = atlas().await;
    Mock::given(method("DELETE"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": 404,
            "errorCode": "USERNAME_NOT_FOUND",
            "detail": "No user with username ghost exists.",
            "reason": "Not Found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = db
        .delete_user(DeleteUserRequest::new("ghost"))
        .await
        .unwrap_err();

    assert_eq!(err.remote_status(), Some(404));
    assert!(err.to_string().contains("USERNAME_NOT_FOUND"), "{err}");
}
