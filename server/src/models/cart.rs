// baattak/server/src/models/cart.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
  pub name: String,
  pub quantity: i32,
  pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "cart_status", rename_all = "lowercase")]
pub enum CartStatus {
  New,
  Accepted,
  Declined,
}

impl std::fmt::Display for CartStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      CartStatus::New => "new",
      CartStatus::Accepted => "accepted",
      CartStatus::Declined => "declined",
    })
  }
}

/// An active order waiting for staff to accept or decline it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub id: Uuid,
  #[sqlx(rename = "customer_name")]
  pub user: String,
  pub phone_number: String,
  #[sqlx(json)]
  pub items: Vec<LineItem>,
  pub total_quantity: i32,
  pub total_price: Decimal,
  pub status: CartStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A validated order submission, ready to persist.
#[derive(Debug, Clone)]
pub struct NewCart {
  pub user: String,
  pub phone_number: String,
  pub items: Vec<LineItem>,
  pub total_quantity: i32,
  pub total_price: Decimal,
}
