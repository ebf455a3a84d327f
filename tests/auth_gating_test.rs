//! Bearer-auth gating over the v1 router.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware, Router,
};
use fabtrack_api::{
    api_v1_routes,
    auth::{consts as perm, AuthConfig, AuthService, Claims},
    config::AppConfig,
    events::EventSender,
    handlers::AppServices,
    AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        jwt_secret: SECRET.into(),
        jwt_issuer: "fabtrack-auth".into(),
        jwt_audience: "fabtrack-api".into(),
        host: "127.0.0.1".into(),
        port: 0,
        environment: "test".into(),
        log_level: "info".into(),
        log_json: false,
        auto_migrate: false,
        upload_dir: std::env::temp_dir()
            .join("fabtrack-test-uploads")
            .to_string_lossy()
            .into_owned(),
        public_base_url: "http://localhost:8080/files".into(),
        barcode_lookup_url: None,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        cors_allow_credentials: false,
        db_max_connections: 1,
        db_min_connections: 1,
        request_timeout_secs: 5,
    }
}

fn token(permissions: Vec<String>) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        name: Some("Tester".into()),
        email: None,
        roles: vec![],
        permissions,
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: now + 3600,
        iss: "fabtrack-auth".into(),
        aud: "fabtrack-api".into(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn num_items_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
    let mut map = std::collections::BTreeMap::new();
    map.insert("num_items", sea_orm::Value::BigInt(Some(n)));
    map
}

fn app_with(db: sea_orm::DatabaseConnection) -> Router {
    let db = Arc::new(db);
    let (tx, _rx) = mpsc::channel(16);
    let event_sender = EventSender::new(tx);
    let cfg = test_config();
    let services = AppServices::new(db.clone(), Arc::new(event_sender.clone()), &cfg);
    let state = AppState {
        db,
        config: cfg.clone(),
        event_sender,
        services,
    };

    let auth_service = Arc::new(AuthService::new(AuthConfig::new(
        cfg.jwt_secret.clone(),
        cfg.jwt_issuer.clone(),
        cfg.jwt_audience.clone(),
    )));

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .layer(middleware::from_fn_with_state(
            auth_service,
            |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
             mut req: axum::http::Request<Body>,
             next: middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        .with_state(state)
}

#[tokio::test]
async fn status_endpoint_needs_no_token() {
    let app = app_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = app_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = app_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .header("Authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_without_the_permission_is_forbidden() {
    let app = app_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .header(
                    "Authorization",
                    format!("Bearer {}", token(vec![perm::SALES_READ.into()])),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn permitted_token_reaches_the_handler() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // list_products: count, then page fetch
        .append_query_results(vec![vec![num_items_row(0)]])
        .append_query_results(vec![Vec::<fabtrack_api::entities::product::Model>::new()])
        .into_connection();
    let app = app_with(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .header(
                    "Authorization",
                    format!("Bearer {}", token(vec![perm::PRODUCTS_READ.into()])),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
