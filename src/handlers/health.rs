use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::errors::ApiError;
use crate::filters::OrderFilter;
use crate::state::AppState;

/// Liveness plus a store round-trip.
pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let orders = state.orders.count(&OrderFilter::new()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ok", "orders": orders })))
}
