// server/src/web/handlers/metrics_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::metrics;
use crate::state::AppState;

#[instrument(name = "handler::today_revenue", skip(app_state))]
pub async fn today_revenue_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let total = metrics::today_revenue(app_state.history.as_ref(), Utc::now()).await?;
  Ok(HttpResponse::Ok().json(json!({ "totalRevenueToday": total })))
}

#[instrument(name = "handler::total_orders", skip(app_state))]
pub async fn total_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let total = metrics::total_orders(app_state.history.as_ref()).await?;
  Ok(HttpResponse::Ok().json(json!({ "totalOrders": total })))
}

#[instrument(name = "handler::user_count", skip(app_state))]
pub async fn user_count_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let count = metrics::users_last_week(app_state.users.as_ref(), Utc::now()).await?;
  Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

#[instrument(name = "handler::avg_order_value", skip(app_state))]
pub async fn avg_order_value_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let avg = metrics::avg_order_value_last_week(app_state.history.as_ref(), Utc::now()).await?;
  Ok(HttpResponse::Ok().json(json!({ "avgOrderValueLastWeek": avg })))
}

#[instrument(name = "handler::recent_orders_today", skip(app_state))]
pub async fn recent_orders_today_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let carts = metrics::recent_orders_today(app_state.carts.as_ref(), Utc::now()).await?;
  Ok(HttpResponse::Ok().json(carts))
}

#[instrument(name = "handler::popular_items", skip(app_state))]
pub async fn popular_items_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let items = metrics::popular_items(app_state.history.as_ref()).await?;
  Ok(HttpResponse::Ok().json(items))
}

#[instrument(name = "handler::order_histories", skip(app_state))]
pub async fn order_histories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders = app_state.history.list().await?;
  Ok(HttpResponse::Ok().json(orders))
}
