use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::entities::order::{Order, OrderDraft};
use crate::errors::ApiError;
use crate::filters::{ListRequest, ListScope, OrderFilter};
use crate::repositories::ListOrdersQuery;
use crate::state::AppState;
use crate::validation::validate;

/// Raw query pairs, in request order. Parsed by [`ListRequest::parse`].
pub type QueryPairs = web::Query<Vec<(String, String)>>;

#[derive(Debug, Serialize)]
struct OrderResponse {
    success: bool,
    data: Order,
}

impl OrderResponse {
    fn new(data: Order) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub success: bool,
    pub data: Vec<Order>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_orders: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sold_orders: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cancelled_orders: Option<u64>,
}

async fn count_if(state: &AppState, filter: Option<OrderFilter>) -> Result<u64, ApiError> {
    match filter {
        Some(f) => Ok(state.orders.count(&f).await?),
        None => Ok(0),
    }
}

/// One page of a listing, with totals. Counts and the page are separate
/// reads and are not taken from a single snapshot.
pub(crate) async fn list_page(
    state: &AppState,
    scope: ListScope,
    pairs: Vec<(String, String)>,
) -> Result<OrderPage, ApiError> {
    let req = ListRequest::parse(scope, pairs)?;

    let total_orders = state.orders.count(&req.filter).await?;
    let (sold, cancelled) = if scope.reports_outcomes() {
        let (sold, cancelled) = req.filter.outcome_filters();
        (
            Some(count_if(state, sold).await?),
            Some(count_if(state, cancelled).await?),
        )
    } else {
        (None, None)
    };

    let data = state
        .orders
        .list(ListOrdersQuery {
            filter: req.filter.clone(),
            sort: req.sort(),
            skip: req.skip(),
            limit: Some(req.limit),
        })
        .await?;

    Ok(OrderPage {
        success: true,
        data,
        current_page: req.page,
        total_pages: total_orders.div_ceil(req.limit),
        total_orders,
        total_sold_orders: sold,
        total_cancelled_orders: cancelled,
    })
}

pub async fn list_orders(
    state: web::Data<AppState>,
    q: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let page = list_page(&state, ListScope::All, q.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn list_active(
    state: web::Data<AppState>,
    q: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let page = list_page(&state, ListScope::Active, q.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn list_inactive(
    state: web::Data<AppState>,
    q: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let page = list_page(&state, ListScope::Inactive, q.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Accepts any JSON body so malformed payloads get the usual error shape.
fn draft_from(body: Value) -> Result<OrderDraft, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(format!("invalid order: {e}")))
}

pub async fn create_order(
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let draft = draft_from(payload.into_inner())?;
    let new = validate(&draft)?;
    let created = state.orders.create(new).await?;
    info!(order_id = %created.id, registration = %created.registration, "order created");
    Ok(HttpResponse::Created().json(OrderResponse::new(created)))
}

pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let order = state.orders.get_by_id(&id).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::new(order)))
}

/// Partial update: the patch is overlaid on the stored order and the result
/// must pass the same rules as a new order.
pub async fn update_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let current = state.orders.get_by_id(&id).await?;
    let draft = OrderDraft::from(&current)
        .merge_patch(payload.into_inner())
        .map_err(|e| ApiError::BadRequest(format!("invalid order: {e}")))?;
    let next = validate(&draft)?;
    let updated = state.orders.update(&id, next).await?;
    info!(order_id = %updated.id, status = %updated.order_status, "order updated");
    Ok(HttpResponse::Ok().json(OrderResponse::new(updated)))
}

pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.orders.delete(&id).await?;
    info!(order_id = %id, "order deleted");
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": {} })))
}
