//! # Stockroom API
//!
//! JSON-over-HTTP server for the Stockroom inventory and point-of-sale
//! backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Routes                                      │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  auth          │  │  products      │  │  sales                     ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • list   (pub) │  │ • create  (bearer)         ││
//! │  │ • login        │  │ • get    (pub) │  │ • list    (bearer)         ││
//! │  │                │  │ • create/update│  │ • get     (bearer)         ││
//! │  │                │  │   /delete      │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  stats  (pub)  │  │  health (pub)  │   fallback → 404 Not Found    │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  Layers: TraceLayer (request spans) → CorsLayer (permissive)           │
//! │  State:  Arc<AppState> { Database, JwtManager, ApiConfig }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config::ApiConfig`]):
//! - `BIND_ADDR`, `PORT` - listen address (default: 0.0.0.0:5000)
//! - `DATABASE_PATH` - SQLite file (default: stockroom.db)
//! - `JWT_SECRET`, `JWT_LIFETIME_SECS` - token signing (default lifetime 8h)
//! - `ADMIN_USERNAME`, `ADMIN_PASSWORD` - bootstrap admin (default admin/admin)

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use stockroom_core::Role;
use stockroom_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// Re-exports
pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Arc<Self> {
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs);
        Arc::new(AppState { db, jwt, config })
    }
}

/// Builds the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/products",
            get(handlers::products::list).post(handlers::products::create),
        )
        .route(
            "/api/products/{id}",
            get(handlers::products::get)
                .put(handlers::products::update)
                .delete(handlers::products::delete),
        )
        .route(
            "/api/sales",
            get(handlers::sales::list).post(handlers::sales::create),
        )
        .route("/api/sales/{id}", get(handlers::sales::get))
        .route("/api/stats", get(handlers::stats::summary))
        .fallback(handlers::health::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Creates the configured admin account when no users exist.
///
/// Returns `true` when an account was created.
pub async fn ensure_default_admin(db: &Database, config: &ApiConfig) -> ApiResult<bool> {
    let users = db.users();
    if users.count().await? > 0 {
        return Ok(false);
    }

    let password_hash = auth::hash_password(&config.admin_password)?;
    let admin = users
        .insert(&config.admin_username, &password_hash, Role::Admin)
        .await?;

    warn!(
        username = %admin.username,
        "No users found; created default admin account. Change its password."
    );
    info!(user_id = %admin.id, "Default admin ready");
    Ok(true)
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use stockroom_db::DbConfig;
    use tower::ServiceExt;

    async fn test_app() -> (Router, Arc<AppState>) {
        let config = ApiConfig::from_lookup(|_| None).unwrap();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, config);
        ensure_default_admin(&state.db, &state.config).await.unwrap();
        (build_router(state.clone()), state)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_product(app: &Router, token: &str, name: &str, price: f64, qty: i64) -> Value {
        let (status, body) = send(
            app,
            "POST",
            "/api/products",
            Some(token),
            Some(json!({ "name": name, "price": price, "quantity": qty })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }

    #[tokio::test]
    async fn test_health_and_fallback() {
        let (app, _) = test_app().await;

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, "GET", "/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_default_admin_seeded_once() {
        let (_, state) = test_app().await;
        assert_eq!(state.db.users().count().await.unwrap(), 1);
        assert!(!ensure_default_admin(&state.db, &state.config).await.unwrap());
        assert_eq!(state.db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (app, _) = test_app().await;
        let creds = json!({ "username": "cashier", "password": "pw" });

        let (status, body) =
            send(&app, "POST", "/api/auth/register", None, Some(creds.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "cashier");
        assert_eq!(body["role"], "staff");
        assert!(body.get("password_hash").is_none());

        let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(creds)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "DUPLICATE");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "username": "nopass" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "password is required");

        let token = login(&app, "cashier", "pw").await;
        let (status, _) = send(&app, "GET", "/api/sales", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_credentials_look_the_same() {
        let (app, _) = test_app().await;

        let (wrong_pw_status, wrong_pw) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "wrong" })),
        )
        .await;
        let (unknown_status, unknown) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "ghost", "password": "wrong" })),
        )
        .await;

        assert_eq!(wrong_pw_status, StatusCode::BAD_REQUEST);
        assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
        assert_eq!(wrong_pw, unknown);
        assert_eq!(wrong_pw["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_admin_registration_requires_admin() {
        let (app, _) = test_app().await;
        let new_admin = json!({ "username": "boss", "password": "pw", "role": "admin" });

        let (status, body) =
            send(&app, "POST", "/api/auth/register", None, Some(new_admin.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing token");

        send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "username": "staffer", "password": "pw" })),
        )
        .await;
        let staff_token = login(&app, "staffer", "pw").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(&staff_token),
            Some(new_admin.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Insufficient role");

        let admin_token = login(&app, "admin", "admin").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(&admin_token),
            Some(new_admin),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_protected_routes_reject_bad_tokens() {
        let (app, state) = test_app().await;
        let product = json!({ "name": "Milk", "price": 1.29, "quantity": 5 });

        let (status, body) =
            send(&app, "POST", "/api/products", None, Some(product.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing token");

        let (status, body) = send(
            &app,
            "POST",
            "/api/products",
            Some("abc.def.ghi"),
            Some(product.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");

        let admin = state
            .db
            .users()
            .get_by_username("admin")
            .await
            .unwrap()
            .unwrap();
        let expired = JwtManager::new(&state.config.jwt_secret, -60)
            .generate_token(&admin)
            .unwrap();
        let (status, body) =
            send(&app, "POST", "/api/products", Some(&expired), Some(product)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");

        let (status, _) = send(&app, "GET", "/api/sales", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_product_crud() {
        let (app, _) = test_app().await;
        let token = login(&app, "admin", "admin").await;

        let created = create_product(&app, &token, "Milk 1L", 1.29, 20).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["category"], "General");
        assert!(created["sku"].as_str().unwrap().starts_with("SKU-"));

        let (status, body) = send(&app, "GET", "/api/products", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "price": 1.49 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 1.49);
        assert_eq!(body["quantity"], 20);

        let (status, body) = send(
            &app,
            "POST",
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Bad", "price": -1, "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/products/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["deleted"]["id"], id.as_str());

        let (status, _) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sale_flow() {
        let (app, _) = test_app().await;
        let token = login(&app, "admin", "admin").await;

        let product = create_product(&app, &token, "Apple", 2.5, 10).await;
        let id = product["id"].as_str().unwrap().to_string();

        let (status, sale) = send(
            &app,
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({ "items": [{ "productId": id, "qty": 3 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale["totalAmount"], 7.5);
        assert_eq!(sale["items"][0]["lineTotal"], 7.5);
        assert_eq!(sale["staffUsername"], "admin");

        let (_, product) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
        assert_eq!(product["quantity"], 7);

        let (status, body) = send(
            &app,
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({ "items": [{ "productId": id, "qty": 8 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        let (status, body) =
            send(&app, "POST", "/api/sales", Some(&token), Some(json!({ "items": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "items are required");

        let (_, product) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
        assert_eq!(product["quantity"], 7);

        let (status, body) = send(&app, "GET", "/api/sales", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sales"].as_array().unwrap().len(), 1);

        let sale_id = sale["id"].as_str().unwrap();
        let (status, body) =
            send(&app, "GET", &format!("/api/sales/{sale_id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["name"], "Apple");

        let (status, stats) = send(&app, "GET", "/api/stats", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalProducts"], 1);
        assert_eq!(stats["totalStockUnits"], 7);
        assert_eq!(stats["totalStockValue"], 17.5);
        assert_eq!(stats["totalEarnings"], 7.5);
    }

    #[tokio::test]
    async fn test_dashboard_client_payloads() {
        let (app, _) = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");
        let token = body["token"].as_str().unwrap().to_string();

        // Product form submits every field, blanks included.
        let (status, product) = send(
            &app,
            "POST",
            "/api/products",
            Some(&token),
            Some(json!({
                "name": "Sparkling Water",
                "sku": "",
                "category": "",
                "price": 0.29,
                "quantity": 12,
                "imageUrl": ""
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{product}");
        assert_eq!(product["price"], 0.29);
        assert_eq!(product["category"], "General");
        assert_eq!(product["imageUrl"], "");
        assert!(product["createdAt"].is_string());
        let id = product["id"].as_str().unwrap().to_string();

        let (status, product) = send(
            &app,
            "PUT",
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "price": "0.35", "imageUrl": "water.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{product}");
        assert_eq!(product["price"], 0.35);
        assert_eq!(product["imageUrl"], "water.png");

        // Checkout sends the cart as productId/qty pairs.
        let (status, sale) = send(
            &app,
            "POST",
            "/api/sales",
            Some(&token),
            Some(json!({ "items": [{ "productId": id, "qty": 3 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{sale}");
        assert_eq!(sale["totalAmount"], 1.05);
        assert_eq!(sale["items"][0]["productId"], id.as_str());
        assert_eq!(sale["items"][0]["qty"], 3);
        assert_eq!(sale["items"][0]["price"], 0.35);
        assert_eq!(sale["items"][0]["lineTotal"], 1.05);
        assert!(sale["createdAt"].is_string());

        let (_, body) = send(&app, "GET", "/api/sales", Some(&token), None).await;
        assert_eq!(body["sales"][0]["totalAmount"], 1.05);

        let (_, stats) = send(&app, "GET", "/api/stats", None, None).await;
        assert_eq!(stats["totalStockUnits"], 9);
        assert_eq!(stats["totalStockValue"], 3.15);
        assert_eq!(stats["totalEarnings"], 1.05);
    }

    #[tokio::test]
    async fn test_oversized_product_rejected_and_stats_stay_up() {
        let (app, _) = test_app().await;
        let token = login(&app, "admin", "admin").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Gold", "price": 100_000_000.0, "quantity": 10_000_000_000_i64 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        create_product(&app, &token, "Gold", 1_000_000.0, 1_000_000).await;
        let (status, stats) = send(&app, "GET", "/api/stats", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalStockValue"], 1e12);
    }

    #[tokio::test]
    async fn test_malformed_json_is_client_error() {
        let (app, _) = test_app().await;
        let token = login(&app, "admin", "admin").await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/sales")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
