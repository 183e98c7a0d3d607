// baattak/server/src/models/order_history.rs

use super::cart::{Cart, LineItem};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable record of a finalised order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
  pub id: Uuid,
  pub cart_id: Uuid,
  #[sqlx(rename = "customer_name")]
  pub user: String,
  pub phone_number: String,
  #[sqlx(json)]
  pub items: Vec<LineItem>,
  pub total_quantity: i32,
  pub total_price: Decimal,
  /// When the originating cart was submitted.
  pub created_at: DateTime<Utc>,
  pub archived_at: DateTime<Utc>,
}

impl OrderHistory {
  pub fn from_cart(cart: Cart, archived_at: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      cart_id: cart.id,
      user: cart.user,
      phone_number: cart.phone_number,
      items: cart.items,
      total_quantity: cart.total_quantity,
      total_price: cart.total_price,
      created_at: cart.created_at,
      archived_at,
    }
  }
}
