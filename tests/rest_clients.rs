//! Hosted-service client tests
//!
//! The store, auth and contact-relay clients run against a wiremock server
//! speaking the hosted dialects.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use uuid::Uuid;
use wiremock::matchers::{bearer_token, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use folio::auth::{AdminAllowList, AuthService, RestAuth, SessionGuard};
use folio::db::{ContentStore, RestStore, RestStoreConfig};
use folio::services::{ContactMessage, ContactRelay, ContentAccess};
use folio::FolioError;

const ANON_KEY: &str = "anon-key";

fn config(server: &MockServer) -> RestStoreConfig {
    RestStoreConfig {
        base_url: server.uri(),
        anon_key: ANON_KEY.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn blog_row(id: Uuid, slug: &str, views: u64) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Kyoto in Autumn",
        "slug": slug,
        "excerpt": "Leaves",
        "content": "<p>Temples</p>",
        "category": "Travel Stories",
        "tags": ["japan"],
        "read_time": 6,
        "author": "Site Author",
        "views": views,
        "published": true,
        "created_at": "2026-03-01T10:00:00Z"
    })
}

fn token_body(email: &str) -> serde_json::Value {
    json!({
        "access_token": "access-123",
        "refresh_token": "refresh-456",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": { "id": "user-1", "email": email }
    })
}

// ============================================================================
// Content store
// ============================================================================

#[tokio::test]
async fn test_published_listing_query() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/blogs"))
        .and(query_param("published", "eq.true"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "50"))
        .and(header("apikey", ANON_KEY))
        .and(bearer_token(ANON_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([blog_row(id, "kyoto", 3)])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RestStore::new(config(&server)).unwrap());
    let posts = ContentAccess::new(store).list_published_blogs().await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, id);
    assert_eq!(posts[0].views, 3);
}

#[tokio::test]
async fn test_store_error_message_surfaces() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/research_articles"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    let store = Arc::new(RestStore::new(config(&server)).unwrap());
    let err = ContentAccess::new(store)
        .list_published_articles()
        .await
        .unwrap_err();

    match err {
        FolioError::Store(msg) => assert_eq!(msg, "500: boom"),
        other => panic!("expected store error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_view_reads_then_patches() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/blogs"))
        .and(query_param("slug", "eq.kyoto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([blog_row(id, "kyoto", 7)])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/blogs"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(body_json(json!({ "views": 8 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([blog_row(id, "kyoto", 8)])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RestStore::new(config(&server)).unwrap());
    let post = ContentAccess::new(store).view_blog("kyoto").await.unwrap();

    assert_eq!(post.views, 8);
}

#[tokio::test]
async fn test_view_refused_by_row_policy_is_not_counted() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/blogs"))
        .and(query_param("slug", "eq.kyoto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([blog_row(id, "kyoto", 7)])))
        .mount(&server)
        .await;
    // Row policies filter the PATCH down to zero rows rather than failing it
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/blogs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RestStore::new(config(&server)).unwrap());
    let post = ContentAccess::new(store).view_blog("kyoto").await.unwrap();

    assert_eq!(post.views, 7);
}

#[tokio::test]
async fn test_user_handle_sends_access_token() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/blogs"))
        .and(header("apikey", ANON_KEY))
        .and(bearer_token("admin-token"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([blog_row(id, "kyoto", 0)])))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(config(&server)).unwrap();
    let rows = store
        .as_user("admin-token")
        .update("blogs", &id.to_string(), json!({ "published": false }))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_download_counter_rpc() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/increment_research_downloads"))
        .and(body_json(json!({ "article_id": id })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RestStore::new(config(&server)).unwrap());
    ContentAccess::new(store).increment_downloads(id).await;
}

#[tokio::test]
async fn test_download_counter_failure_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/increment_research_downloads"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RestStore::new(config(&server)).unwrap());
    // Returns unit either way
    ContentAccess::new(store).increment_downloads(Uuid::new_v4()).await;
}

// ============================================================================
// Auth service
// ============================================================================

#[tokio::test]
async fn test_password_sign_in() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .and(body_json(json!({ "email": "admin@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("admin@example.com")))
        .expect(1)
        .mount(&server)
        .await;

    let auth = RestAuth::new(config(&server)).unwrap();
    let mut events = auth.subscribe();
    let session = auth
        .sign_in_with_password("admin@example.com", "pw")
        .await
        .unwrap();

    assert_eq!(session.access_token, "access-123");
    assert_eq!(session.user.email.as_deref(), Some("admin@example.com"));
    assert!(session.expires_at.is_some());
    assert!(events.try_recv().is_ok());
}

#[tokio::test]
async fn test_bad_credentials_are_auth_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let auth = RestAuth::new(config(&server)).unwrap();
    let err = auth.sign_in_with_password("a@example.com", "nope").await.unwrap_err();

    match err {
        FolioError::Auth(msg) => assert_eq!(msg, "Invalid login credentials"),
        other => panic!("expected auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_user_on_rejected_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(bearer_token("stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "expired" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(bearer_token("fresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "user-1", "email": "admin@example.com" })),
        )
        .mount(&server)
        .await;

    let auth = RestAuth::new(config(&server)).unwrap();

    assert!(auth.get_user("stale").await.unwrap().is_none());
    let user = auth.get_user("fresh").await.unwrap().unwrap();
    assert_eq!(user.id, "user-1");
}

#[tokio::test]
async fn test_get_user_outage_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let auth = RestAuth::new(config(&server)).unwrap();
    assert!(auth.get_user("any").await.is_err());
}

#[tokio::test]
async fn test_guard_signs_out_non_admin() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("reader@example.com")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(bearer_token("access-123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let auth: Arc<dyn AuthService> = Arc::new(RestAuth::new(config(&server)).unwrap());
    let guard = SessionGuard::new(auth, AdminAllowList::new(["admin@example.com"]));

    let err = guard.login("reader@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, FolioError::Unauthorized(_)));
}

#[tokio::test]
async fn test_guard_fails_closed_when_auth_is_down() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let auth: Arc<dyn AuthService> = Arc::new(RestAuth::new(config(&server)).unwrap());
    let guard = SessionGuard::new(auth, AdminAllowList::new(["admin@example.com"]));

    assert!(!guard.check_authorization(Some("token")).await.is_authorized());
}

// ============================================================================
// Contact relay
// ============================================================================

fn message() -> ContactMessage {
    ContactMessage {
        name: "Ada".into(),
        email: "ada@example.com".into(),
        subject: "Collaboration".into(),
        message: "Shall we write a paper?".into(),
    }
}

#[tokio::test]
async fn test_contact_relay_posts_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/f/contact"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "subject": "Collaboration",
            "message": "Shall we write a paper?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let relay = ContactRelay::new(format!("{}/f/contact", server.uri()), Duration::from_secs(5)).unwrap();
    assert_ok!(relay.send(&message()).await);
}

#[tokio::test]
async fn test_contact_relay_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/f/contact"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let relay = ContactRelay::new(format!("{}/f/contact", server.uri()), Duration::from_secs(5)).unwrap();
    let err = relay.send(&message()).await.unwrap_err();

    assert!(matches!(err, FolioError::Relay(_)));
}

#[tokio::test]
async fn test_contact_relay_validates_before_sending() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let relay = ContactRelay::new(server.uri(), Duration::from_secs(5)).unwrap();
    let mut msg = message();
    msg.subject.clear();

    let err = relay.send(&msg).await.unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));
}
