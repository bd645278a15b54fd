use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shopassist_rs::config::Config;
use shopassist_rs::db::{
    DbError, DbResult, DocumentFilter, DocumentRepo, CatalogRepo, Repository, StoredDocument,
};
use shopassist_rs::server::{build_router, AppState};

/// Store whose table listing always fails.
struct BrokenRepo;

#[async_trait]
impl CatalogRepo for BrokenRepo {
    fn name(&self) -> String {
        "broken".to_string()
    }

    async fn list_collections(&self) -> DbResult<Vec<String>> {
        Err(DbError::Validation(
            "collections".to_string(),
            "x".repeat(100),
        ))
    }
}

#[async_trait]
impl DocumentRepo for BrokenRepo {
    async fn create_document(&self, collection: &str, _data: Value) -> DbResult<String> {
        Err(DbError::UnknownCollection(collection.to_string()))
    }

    async fn get_documents(
        &self,
        collection: &str,
        _filter: &DocumentFilter,
        _limit: Option<i64>,
    ) -> DbResult<Vec<StoredDocument>> {
        Err(DbError::UnknownCollection(collection.to_string()))
    }
}

#[async_trait]
impl Repository for BrokenRepo {
    async fn close(&self) {}
}

/// Store with more collections than `/test` lists.
struct CrowdedRepo;

fn crowded_names() -> Vec<String> {
    (1..=12).map(|i| format!("collection_{:02}", i)).collect()
}

#[async_trait]
impl CatalogRepo for CrowdedRepo {
    fn name(&self) -> String {
        "crowded".to_string()
    }

    async fn list_collections(&self) -> DbResult<Vec<String>> {
        Ok(crowded_names())
    }
}

#[async_trait]
impl DocumentRepo for CrowdedRepo {
    async fn create_document(&self, collection: &str, _data: Value) -> DbResult<String> {
        Err(DbError::UnknownCollection(collection.to_string()))
    }

    async fn get_documents(
        &self,
        _collection: &str,
        _filter: &DocumentFilter,
        _limit: Option<i64>,
    ) -> DbResult<Vec<StoredDocument>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl Repository for CrowdedRepo {
    async fn close(&self) {}
}

fn env_config(pairs: &[(&str, &str)]) -> Config {
    let mut config = Config::default();
    config
        .apply_env(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap();
    config
}

fn app(config: Config, db: Option<Arc<dyn Repository>>) -> Router {
    build_router(AppState::new(config, db))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn assist(app: Router, body: Value) -> (StatusCode, Value) {
    let req = Request::post("/api/assist")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

#[tokio::test]
async fn root_and_hello() {
    let (status, body) = get(app(Config::default(), None), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Shopping AI Assistant Backend"}));

    let (status, body) = get(app(Config::default(), None), "/api/hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Hello from the backend API!"}));
}

#[tokio::test]
async fn assist_earbuds() {
    let (status, body) = assist(
        app(Config::default(), None),
        json!({"message": "Looking for wireless EARBUDS", "conversation_id": "c42"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0]["id"], "p1");
    assert_eq!(recs[0]["price"], 348.0);
    assert_eq!(recs[0]["retailers"][0]["name"], "Amazon");
    assert_eq!(recs[0]["retailers"][0]["is_best"], true);
    assert_eq!(recs[1]["id"], "p2");
    assert_eq!(body["tips"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn assist_default_branch() {
    let (status, body) =
        assist(app(Config::default(), None), json!({"message": "gift idea"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendations"][0]["id"], "g1");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 1);
    assert_eq!(body["tips"], json!(["Bundle with a keyring holder."]));

    let (_, empty) = assist(app(Config::default(), None), json!({"message": ""})).await;
    assert_eq!(empty, body);
}

#[tokio::test]
async fn assist_is_repeatable() {
    let (_, first) = assist(app(Config::default(), None), json!({"message": "headphones"})).await;
    let (_, second) = assist(app(Config::default(), None), json!({"message": "headphones"})).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn assist_rejects_bad_bodies() {
    let (status, _) = assist(app(Config::default(), None), json!({"conversation_id": "c1"})).await;
    assert!(status.is_client_error());

    let (status, _) = assist(app(Config::default(), None), json!({"message": 42})).await;
    assert!(status.is_client_error());

    let req = Request::post("/api/assist")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(app(Config::default(), None), req).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn trending_items() {
    let (status, body) = get(app(Config::default(), None), "/api/trending?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    let categories: Vec<_> = items.iter().map(|i| i["category"].as_str().unwrap()).collect();
    assert_eq!(categories, vec!["Audio", "Computers", "Home"]);
}

#[tokio::test]
async fn db_status_without_database() {
    let (status, body) = get(app(Config::default(), None), "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "✅ Running");
    assert_eq!(body["database"], "⚠️  Available but not initialized");
    assert_eq!(body["connection_status"], "Not Connected");
    assert_eq!(body["database_url"], "❌ Not Set");
    assert_eq!(body["database_name"], "❌ Not Set");
    assert_eq!(body["collections"], json!([]));
}

#[tokio::test]
async fn db_status_with_sqlite() {
    let config = env_config(&[("DATABASE_URL", "sqlite::memory:")]);
    let db = shopassist_rs::connect_database(&config).await;
    assert!(db.is_some());

    let (status, body) = get(app(config, db), "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "✅ Connected & Working");
    assert_eq!(body["connection_status"], "Connected");
    assert_eq!(body["database_url"], "✅ Set");
    assert_eq!(body["database_name"], "❌ Not Set");
    assert_eq!(
        body["collections"],
        json!(["conversation", "message", "product", "trenditem", "user"])
    );
}

#[tokio::test]
async fn db_status_reports_store_errors_in_band() {
    let config = env_config(&[("DATABASE_NAME", "shop")]);
    let db: Arc<dyn Repository> = Arc::new(BrokenRepo);

    let (status, body) = get(app(config, Some(db)), "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connection_status"], "Connected");
    assert_eq!(body["database_name"], "✅ Set");
    assert_eq!(body["collections"], json!([]));

    let full = format!("Invalid field collections: {}", "x".repeat(100));
    let expected: String = full.chars().take(50).collect();
    assert_eq!(
        body["database"],
        format!("⚠️  Connected but Error: {}", expected)
    );
}

#[tokio::test]
async fn file_configured_database_reports_env_unset() {
    let mut config = Config::default();
    config.database.url = Some("sqlite::memory:".to_string());
    config.database.name = Some("shop".to_string());
    config.apply_env(|_| None).unwrap();
    let db = shopassist_rs::connect_database(&config).await;
    assert!(db.is_some());

    let (status, body) = get(app(config, db), "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "✅ Connected & Working");
    assert_eq!(body["database_url"], "❌ Not Set");
    assert_eq!(body["database_name"], "❌ Not Set");
}

#[tokio::test]
async fn db_status_lists_first_ten_collections() {
    let db: Arc<dyn Repository> = Arc::new(CrowdedRepo);

    let (status, body) = get(app(Config::default(), Some(db)), "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "✅ Connected & Working");
    let expected: Vec<String> = crowded_names().into_iter().take(10).collect();
    assert_eq!(body["collections"], json!(expected));
    assert_eq!(body["collections"][9], "collection_10");
}

#[tokio::test]
async fn connect_failure_leaves_no_store() {
    let mut config = Config::default();
    config.database.url = Some("sqlite:///nonexistent-shopassist-dir/nested/shop.db".to_string());
    assert!(shopassist_rs::connect_database(&config).await.is_none());

    assert!(shopassist_rs::connect_database(&Config::default()).await.is_none());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = get(app(Config::default(), None), "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_allows_credentials() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/assist")
        .header(header::ORIGIN, "https://shop.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let resp = app(Config::default(), None).oneshot(req).await.unwrap();

    assert!(resp.status().is_success());
    let headers = resp.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://shop.example"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
}
