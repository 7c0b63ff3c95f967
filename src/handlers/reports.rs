use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::orders::{list_page, QueryPairs};
use crate::auth::AuthUser;
use crate::entities::order::Flag;
use crate::errors::ApiError;
use crate::filters::{FilterField, ListScope, OrderFilter};
use crate::state::AppState;
use crate::validation::reason_options as narrow_reasons;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub active_orders: u64,
    pub sold_orders: u64,
    /// Inactive orders without a deal.
    pub canceled_orders: u64,
    pub total_orders: u64,
    pub active_orders_percentage: f64,
    pub canceled_orders_percentage: f64,
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub(crate) async fn order_stats(state: &AppState) -> Result<OrderStats, ApiError> {
    let all = OrderFilter::new();
    let inactive = all.with_only(FilterField::OrderStatus, "Inactive");

    let total_orders = state.orders.count(&all).await?;
    let active_orders = state
        .orders
        .count(&all.with_only(FilterField::OrderStatus, "Active"))
        .await?;
    let sold_orders = state
        .orders
        .count(&inactive.with_only(FilterField::IsDeal, "Yes"))
        .await?;
    let canceled_orders = state
        .orders
        .count(&inactive.with_only(FilterField::IsDeal, "No"))
        .await?;

    Ok(OrderStats {
        active_orders,
        sold_orders,
        canceled_orders,
        total_orders,
        active_orders_percentage: percent(active_orders, total_orders),
        canceled_orders_percentage: percent(canceled_orders, total_orders),
    })
}

#[derive(Serialize)]
struct StatsResponse {
    success: bool,
    #[serde(flatten)]
    stats: OrderStats,
}

pub async fn order_status(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let stats = order_stats(&state).await?;
    Ok(HttpResponse::Ok().json(StatsResponse {
        success: true,
        stats,
    }))
}

/// Inactive, not-dealt orders oldest closing first; `year`/`month`/`day`
/// narrow by closing date.
pub async fn cancellation_report(
    state: web::Data<AppState>,
    q: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let page = list_page(&state, ListScope::Cancellation, q.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Distinct values for every filterable field, keyed by query parameter name.
pub async fn filter_options(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let mut options: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for field in FilterField::ALL {
        options.insert(field.key(), state.orders.distinct(field).await?);
    }
    Ok(HttpResponse::Ok().json(options))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonQuery {
    #[serde(default)]
    pub is_show_up: Option<String>,
    #[serde(default)]
    pub is_deal: Option<String>,
}

fn flag_param(name: &str, raw: Option<&str>) -> Result<Option<Flag>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid {name}: {v}"))),
    }
}

/// Recorded reasons that fit the given show-up/deal answers.
pub async fn reason_options(
    state: web::Data<AppState>,
    q: web::Query<ReasonQuery>,
) -> Result<HttpResponse, ApiError> {
    let show_up = flag_param("isShowUp", q.is_show_up.as_deref())?;
    let deal = flag_param("isDeal", q.is_deal.as_deref())?;
    let recorded = state.orders.distinct(FilterField::ReasonForAction).await?;
    let data = narrow_reasons(show_up, deal, recorded);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
}

pub async fn dashboard(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let stats = order_stats(&state).await?;
    Ok(HttpResponse::Ok().json(json!({ "role": user.0.role, "stats": stats })))
}
