//! HTTP-level integration tests for the `/queue` endpoints.

mod common;

use axum::http::StatusCode;
use bayline_core::settings::KEY_MAX_TICKETS_PER_DAY;
use common::{body_json, get_auth, post_auth, post_json_auth, TestShop};
use serde_json::json;

const DATE: &str = "2026-11-02";

async fn take(shop: &TestShop, token: &str, body: serde_json::Value) -> axum::response::Response {
    post_json_auth(shop.app(), "/api/v1/queue/tickets", body, token).await
}

fn own_ticket(shop: &TestShop) -> serde_json::Value {
    json!({
        "vehicle_id": shop.vehicle.id,
        "service_date": DATE,
        "service_type": "Oil change",
        "estimated_time": 45
    })
}

async fn take_own(shop: &TestShop) -> serde_json::Value {
    let response = take(shop, &shop.customer_token(), own_ticket(shop)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn customer_takes_a_number() {
    let shop = TestShop::new();
    let ticket = take_own(&shop).await;

    assert_eq!(ticket["queue_number"], 1);
    assert_eq!(ticket["status"], "waiting");
    assert_eq!(ticket["service_date"], DATE);
    assert_eq!(ticket["customer_id"], shop.customer.id);
}

#[tokio::test]
async fn third_ticket_over_cap_is_refused() {
    let shop = TestShop::new();
    shop.store.set_setting(KEY_MAX_TICKETS_PER_DAY, "2");

    assert_eq!(take_own(&shop).await["queue_number"], 1);
    assert_eq!(take_own(&shop).await["queue_number"], 2);

    let response = take(&shop, &shop.customer_token(), own_ticket(&shop)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CAPACITY_EXCEEDED");
    assert!(json["error"].as_str().unwrap().contains("maximum 2"));

    let response = get_auth(
        shop.app(),
        &format!("/api/v1/queue/availability?date={DATE}"),
        &shop.customer_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["available"], false);
    assert_eq!(json["data"]["remaining"], 0);
    assert_eq!(json["data"]["max_per_day"], 2);
    assert_eq!(json["data"]["next_queue_number"], 3);
}

#[tokio::test]
async fn malformed_date_is_a_validation_error() {
    let shop = TestShop::new();
    let mut body = own_ticket(&shop);
    body["service_date"] = json!("02/11/2026");

    let response = take(&shop, &shop.customer_token(), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = get_auth(
        shop.app(),
        "/api/v1/queue/availability?date=tomorrow",
        &shop.customer_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customer_cannot_book_for_someone_else() {
    let shop = TestShop::new();
    let mut body = own_ticket(&shop);
    body["customer_id"] = json!(shop.other_customer.id);

    let response = take(&shop, &shop.customer_token(), body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn staff_books_on_behalf_of_customer() {
    let shop = TestShop::new();

    let response = take(&shop, &shop.mechanic_token(), own_ticket(&shop)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = own_ticket(&shop);
    body["customer_id"] = json!(shop.customer.id);
    let response = take(&shop, &shop.mechanic_token(), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["customer_id"], shop.customer.id);
}

#[tokio::test]
async fn unknown_vehicle_is_404() {
    let shop = TestShop::new();
    let mut body = own_ticket(&shop);
    body["vehicle_id"] = json!(424_242);

    let response = take(&shop, &shop.customer_token(), body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn staff_walks_ticket_through_service() {
    let shop = TestShop::new();
    let id = take_own(&shop).await["id"].as_i64().unwrap();
    let token = shop.mechanic_token();

    for (action, status) in [
        ("call", "called"),
        ("start", "in_service"),
        ("complete", "completed"),
    ] {
        let response = post_auth(
            shop.app(),
            &format!("/api/v1/queue/tickets/{id}/{action}"),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{action}");
        assert_eq!(body_json(response).await["data"]["status"], status);
    }

    let response = post_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets/{id}/cancel"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_STATE_TRANSITION");
    assert_eq!(json["error"], "cannot cancel completed service");
}

#[tokio::test]
async fn customers_cannot_drive_transitions() {
    let shop = TestShop::new();
    let id = take_own(&shop).await["id"].as_i64().unwrap();

    let response = post_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets/{id}/call"),
        &shop.customer_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn no_show_requires_called() {
    let shop = TestShop::new();
    let id = take_own(&shop).await["id"].as_i64().unwrap();

    let response = post_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets/{id}/no-show"),
        &shop.mechanic_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"],
        "can only mark no-show for called customers"
    );
}

#[tokio::test]
async fn only_the_owner_may_cancel() {
    let shop = TestShop::new();
    let id = take_own(&shop).await["id"].as_i64().unwrap();
    let uri = format!("/api/v1/queue/tickets/{id}/cancel");

    let response = post_auth(shop.app(), &uri, &shop.other_customer_token()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_auth(shop.app(), &uri, &shop.customer_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "canceled");
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn progress_reports_position() {
    let shop = TestShop::new();
    let first = take_own(&shop).await["id"].as_i64().unwrap();
    let second = take_own(&shop).await["id"].as_i64().unwrap();

    post_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets/{first}/call"),
        &shop.mechanic_token(),
    )
    .await;

    let response = get_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets/{second}/progress"),
        &shop.customer_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["queue_number"], 2);
    assert_eq!(json["data"]["waiting_ahead"], 1);
    assert_eq!(json["data"]["estimated_wait_minutes"], 30);
    assert_eq!(json["data"]["message"], "1 customer ahead of you");

    let response = get_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets/{second}/progress"),
        &shop.other_customer_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listings_respect_roles() {
    let shop = TestShop::new();
    take_own(&shop).await;
    take_own(&shop).await;

    let response = get_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets?date={DATE}"),
        &shop.customer_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets?date={DATE}"),
        &shop.mechanic_token(),
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let response = get_auth(
        shop.app(),
        &format!("/api/v1/queue/tickets?date={DATE}&number=2"),
        &shop.mechanic_token(),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["queue_number"], 2);

    let response = get_auth(
        shop.app(),
        "/api/v1/queue/tickets/mine",
        &shop.customer_token(),
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let response = get_auth(
        shop.app(),
        "/api/v1/queue/tickets/mine",
        &shop.other_customer_token(),
    )
    .await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_ticket_is_404() {
    let shop = TestShop::new();
    let response = get_auth(
        shop.app(),
        "/api/v1/queue/tickets/9999",
        &shop.admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}
