// baattak/server/src/flows/order_flows.rs

use crate::errors::AppError;
use crate::flows::contexts::{ArchiveOrderCtx, SubmitOrderCtx};
use crate::models::NewCart;
use crate::services::auth_service;
use baattak_flow::{Flow, FlowContext, FlowControl, FlowRegistry};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

pub fn register_submit_order_flow(registry: &FlowRegistry<AppError>) {
  let mut flow = Flow::<SubmitOrderCtx, AppError>::new(&[("validate_order", false, None), ("persist_cart", false, None)])
    .named("submit_order");

  flow.on("validate_order", |ctx: FlowContext<SubmitOrderCtx>| async move {
    let validated = {
      let guard = ctx.read();
      validate_submission(&guard)?
    };
    debug!(user = %validated.user, items = validated.items.len(), "Order submission validated.");
    ctx.write().validated = Some(validated);
    Ok::<_, AppError>(FlowControl::Continue)
  });

  flow.on("persist_cart", |ctx: FlowContext<SubmitOrderCtx>| async move {
    let (carts, new_cart) = {
      let guard = ctx.read();
      let new_cart = guard
        .validated
        .clone()
        .ok_or_else(|| AppError::Internal("Order reached persistence without validation.".to_string()))?;
      (guard.app_state.carts.clone(), new_cart)
    };

    let cart = carts.insert(new_cart).await?;
    info!(cart_id = %cart.id, user = %cart.user, "Cart created.");
    ctx.write().created = Some(cart);
    Ok::<_, AppError>(FlowControl::Continue)
  });

  registry.register(flow);
}

fn validate_submission(ctx: &SubmitOrderCtx) -> Result<NewCart, AppError> {
  let user = ctx.user.as_deref().map(str::trim).unwrap_or_default();
  if user.is_empty() {
    warn!("Order rejected: missing user name.");
    return Err(AppError::Validation("User name is required".to_string()));
  }
  let phone_number = ctx.phone_number.as_deref().map(str::trim).unwrap_or_default();
  if phone_number.is_empty() {
    warn!("Order rejected: missing phone number.");
    return Err(AppError::Validation("Phone number is required".to_string()));
  }
  if !auth_service::is_valid_phone(phone_number) {
    return Err(AppError::Validation("Invalid phone number format".to_string()));
  }

  for item in &ctx.items {
    if item.name.trim().is_empty() {
      return Err(AppError::Validation("Every item needs a name".to_string()));
    }
    if item.quantity < 1 {
      return Err(AppError::Validation(format!("Quantity for '{}' must be at least 1", item.name)));
    }
    if item.price < Decimal::ZERO {
      return Err(AppError::Validation(format!("Price for '{}' cannot be negative", item.name)));
    }
  }

  let total_quantity = ctx
    .total_quantity
    .ok_or_else(|| AppError::Validation("Total quantity is required".to_string()))?;
  let total_price = ctx
    .total_price
    .ok_or_else(|| AppError::Validation("Total price is required".to_string()))?;
  if total_quantity < 0 || total_price < Decimal::ZERO {
    return Err(AppError::Validation("Totals cannot be negative".to_string()));
  }
  if ctx.items.is_empty() && (total_quantity != 0 || !total_price.is_zero()) {
    return Err(AppError::Validation("An order with totals needs at least one item".to_string()));
  }

  Ok(NewCart {
    user: user.to_string(),
    phone_number: phone_number.to_string(),
    items: ctx.items.clone(),
    total_quantity,
    total_price,
  })
}

pub fn register_archive_order_flow(registry: &FlowRegistry<AppError>) {
  let mut flow = Flow::<ArchiveOrderCtx, AppError>::new(&[("archive_cart", false, None)]).named("archive_order");

  flow.on("archive_cart", |ctx: FlowContext<ArchiveOrderCtx>| async move {
    let (carts, cart_id) = {
      let guard = ctx.read();
      (guard.app_state.carts.clone(), guard.cart_id)
    };

    match carts.archive(cart_id).await? {
      Some(order) => {
        info!(%cart_id, order_id = %order.id, "Cart moved to order history.");
        ctx.write().archived = Some(order);
        Ok::<_, AppError>(FlowControl::Continue)
      }
      None => {
        warn!(%cart_id, "Archive requested for unknown cart.");
        Err(AppError::NotFound("Cart not found".to_string()))
      }
    }
  });

  registry.register(flow);
}
