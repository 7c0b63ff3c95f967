#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::from_fn;
use actix_web::web::Data;
use actix_web::App;
use serde_json::{json, Value};

use dealer_orders::{
    auth::{gate::gate, AuthService},
    entities::user::{Role, User},
    repositories::{
        in_memory::{InMemoryOrderRepository, InMemoryUserRepository},
        UserRepository,
    },
    routes,
    state::AppState,
};

pub const PASSWORD: &str = "s3cret-pass";

pub fn test_state() -> Data<AppState> {
    AppState::new(
        InMemoryOrderRepository::default(),
        InMemoryUserRepository::default(),
        AuthService::new(b"integration-secret", 3600, 4, false),
    )
}

pub fn test_app(
    state: Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(from_fn(gate))
        .app_data(state)
        .configure(routes::config)
}

pub async fn add_user(state: &AppState, email: &str, role: Role) -> User {
    let hash = state.auth.hash_password(PASSWORD).unwrap();
    state
        .users
        .create(User::new("Test User".into(), email.into(), hash, role))
        .await
        .unwrap()
}

/// Minimal valid active order.
pub fn order_json(registration: &str, opening: &str) -> Value {
    json!({
        "entryDate": opening,
        "entryTime": "10:00",
        "registration": registration,
        "enquiryType": "Reservation",
        "openingDate": opening,
        "salesExecutive": "Jane Smith",
        "location": "Leeds",
        "customer": "Alan Turing"
    })
}

/// Patch closing an order as sold.
pub fn sold_patch(closing: &str) -> Value {
    json!({
        "orderStatus": "Inactive",
        "closingDate": closing,
        "isShowUp": "Yes",
        "isDeal": "Yes",
        "reasonForAction": "Sold",
        "reasonDetail": "Collected on time",
        "isLossDeal": "No"
    })
}

/// Patch closing an order as cancelled after a visit.
pub fn cancelled_patch(closing: &str) -> Value {
    json!({
        "orderStatus": "Inactive",
        "closingDate": closing,
        "isShowUp": "Yes",
        "isDeal": "No",
        "reasonForAction": "Onsite - price too high",
        "reasonDetail": "Found a cheaper car",
        "isLossDeal": "Yes"
    })
}

/// Sends a request and returns `(status, json body)`.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Creates an order and returns its id.
macro_rules! create_order {
    ($app:expr, $body:expr) => {{
        let (status, body) = send!(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/api/orders")
                .set_json(&$body)
        );
        assert_eq!(status, actix_web::http::StatusCode::CREATED, "{body}");
        body["data"]["_id"].as_str().unwrap().to_string()
    }};
}
