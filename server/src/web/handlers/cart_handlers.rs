// server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::flows::contexts::{ArchiveOrderCtx, SubmitOrderCtx};
use crate::flows::run_flow;
use crate::models::{CartStatus, LineItem};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderPayload {
  pub user: Option<String>,
  pub phone_number: Option<String>,
  #[serde(default)]
  pub items: Vec<LineItem>,
  pub total_quantity: Option<i32>,
  pub total_price: Option<Decimal>,
}

#[instrument(name = "handler::submit_order", skip(app_state, req_payload), fields(user = ?req_payload.user))]
pub async fn submit_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SubmitOrderPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx = SubmitOrderCtx {
    app_state: app_state.get_ref().clone(),
    user: payload.user,
    phone_number: payload.phone_number,
    items: payload.items,
    total_quantity: payload.total_quantity,
    total_price: payload.total_price,
    validated: None,
    created: None,
  };

  let cart = run_flow(&app_state, ctx).await?.created.ok_or_else(|| {
    warn!("Submit flow completed without a cart.");
    AppError::Internal("Order completed without creating a cart.".to_string())
  })?;

  Ok(HttpResponse::Created().json(json!({
    "message": "Cart created successfully",
    "cart": cart,
  })))
}

#[instrument(name = "handler::list_carts", skip(app_state))]
pub async fn list_carts_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let carts = app_state.carts.list().await?;
  info!(count = carts.len(), "Fetched active carts.");
  Ok(HttpResponse::Ok().json(json!({ "carts": carts })))
}

#[instrument(name = "handler::get_cart_by_user", skip(app_state, path), fields(user = %path.as_str()))]
pub async fn get_cart_by_user_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let user = path.into_inner();
  match app_state.carts.find_by_customer(&user).await? {
    Some(cart) => Ok(HttpResponse::Ok().json(json!({ "cart": cart }))),
    None => Err(AppError::NotFound("Cart not found for this user".to_string())),
  }
}

async fn transition(app_state: &AppState, cart_id: Uuid, status: CartStatus) -> Result<HttpResponse, AppError> {
  let cart = app_state
    .carts
    .set_status(cart_id, status)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;
  info!(%cart_id, %status, "Cart status updated.");

  let message = match status {
    CartStatus::Accepted => "Order accepted",
    CartStatus::Declined => "Order declined",
    CartStatus::New => "Order reopened",
  };
  Ok(HttpResponse::Ok().json(json!({ "message": message, "cart": cart })))
}

#[instrument(name = "handler::accept_order", skip(app_state, path), fields(cart_id = %path.as_ref()))]
pub async fn accept_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  transition(&app_state, path.into_inner(), CartStatus::Accepted).await
}

#[instrument(name = "handler::decline_order", skip(app_state, path), fields(cart_id = %path.as_ref()))]
pub async fn decline_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  transition(&app_state, path.into_inner(), CartStatus::Declined).await
}

#[instrument(name = "handler::move_to_history", skip(app_state, path), fields(cart_id = %path.as_ref()))]
pub async fn move_to_history_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let ctx = ArchiveOrderCtx {
    app_state: app_state.get_ref().clone(),
    cart_id: path.into_inner(),
    archived: None,
  };

  let order = run_flow(&app_state, ctx)
    .await?
    .archived
    .ok_or_else(|| AppError::Internal("Archive completed without an order record.".to_string()))?;

  Ok(HttpResponse::Ok().json(json!({
    "message": "Order moved to order history and deleted from real-time orders",
    "order": order,
  })))
}

#[instrument(name = "handler::delete_cart", skip(app_state, path), fields(cart_id = %path.as_ref()))]
pub async fn delete_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let cart_id = path.into_inner();
  if !app_state.carts.delete(cart_id).await? {
    return Err(AppError::NotFound("Cart not found".to_string()));
  }
  info!(%cart_id, "Cart deleted without archiving.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Cart deleted successfully" })))
}
