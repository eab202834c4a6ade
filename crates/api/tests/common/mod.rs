#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use bayline_api::auth::jwt::{generate_access_token, JwtConfig};
use bayline_api::config::{ServerConfig, StoreBackend};
use bayline_api::router::build_app_router;
use bayline_api::state::AppState;
use bayline_core::roles::{ROLE_ADMIN, ROLE_CUSTOMER, ROLE_MECHANIC};
use bayline_db::models::identity::{CreateUser, CreateVehicle, User, Vehicle};
use bayline_db::store::{MemoryStore, Stores};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults and caching disabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        settings_cache_ttl_secs: 0,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// An in-process shop: one admin, one mechanic, two customers with a
/// vehicle each, and the router wired onto the same store.
pub struct TestShop {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub admin: User,
    pub mechanic: User,
    pub customer: User,
    pub vehicle: Vehicle,
    pub other_customer: User,
    pub other_vehicle: Vehicle,
}

impl TestShop {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::with_default_settings());
        let stores = Stores::memory(Arc::clone(&store));
        let state = AppState::new(test_config(), &stores, None);

        let admin = store.insert_user(&user("Ada", "ada@bay.test", ROLE_ADMIN));
        let mechanic = store.insert_user(&user("Mo", "mo@bay.test", ROLE_MECHANIC));
        let customer = store.insert_user(&user("Cy", "cy@bay.test", ROLE_CUSTOMER));
        let other_customer = store.insert_user(&user("Oz", "oz@bay.test", ROLE_CUSTOMER));
        let vehicle = store.insert_vehicle(&vehicle(customer.id, "B 1 CY"));
        let other_vehicle = store.insert_vehicle(&self::vehicle(other_customer.id, "B 2 OZ"));

        Self {
            app: build_app_router(state.clone()),
            store,
            state,
            admin,
            mechanic,
            customer,
            vehicle,
            other_customer,
            other_vehicle,
        }
    }

    /// Fresh router handle; `oneshot` consumes it.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    pub fn token_for(&self, user: &User) -> String {
        generate_access_token(user.id, &user.role, &self.state.config.jwt)
            .expect("token generation should succeed")
    }

    pub fn admin_token(&self) -> String {
        self.token_for(&self.admin)
    }

    pub fn mechanic_token(&self) -> String {
        self.token_for(&self.mechanic)
    }

    pub fn customer_token(&self) -> String {
        self.token_for(&self.customer)
    }

    pub fn other_customer_token(&self) -> String {
        self.token_for(&self.other_customer)
    }
}

fn user(name: &str, email: &str, role: &str) -> CreateUser {
    CreateUser {
        name: name.to_string(),
        email: email.to_string(),
        role: role.to_string(),
    }
}

fn vehicle(owner_id: i64, plate: &str) -> CreateVehicle {
    CreateVehicle {
        owner_id,
        plate_number: plate.to_string(),
        make: None,
        model: None,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::POST, uri, body, token).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::PUT, uri, body, token).await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
