// baattak/server/src/flows/contexts.rs

//! Data threaded through each flow. Every struct carries the `AppState` so
//! steps can reach the repositories without globals.

use crate::models::{Cart, LineItem, NewCart, OrderHistory, User};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone)]
pub struct SubmitOrderCtx {
  pub app_state: AppState,
  pub user: Option<String>,
  pub phone_number: Option<String>,
  pub items: Vec<LineItem>,
  pub total_quantity: Option<i32>,
  pub total_price: Option<Decimal>,
  pub validated: Option<NewCart>,
  pub created: Option<Cart>,
}

#[derive(Clone)]
pub struct ArchiveOrderCtx {
  pub app_state: AppState,
  pub cart_id: Uuid,
  pub archived: Option<OrderHistory>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
  /// Carts older than the cutoff when the sweep started.
  pub examined: usize,
  /// Carts actually moved to history by this sweep.
  pub archived: usize,
}

#[derive(Clone)]
pub struct SweepCtx {
  pub app_state: AppState,
  pub cutoff: DateTime<Utc>,
  pub stale_ids: Vec<Uuid>,
  pub report: SweepReport,
}

#[derive(Clone)]
pub struct RequestOtpCtx {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub username: String,
  pub phone_number: String,
  pub otp: Option<String>,
  pub user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct VerifyOtpCtx {
  pub app_state: AppState,
  pub email: String,
  pub otp: String,
  pub password: Option<String>,
  pub username: Option<String>,
  pub phone_number: Option<String>,
  pub pending_user: Option<User>,
  pub verified_user: Option<User>,
}

#[derive(Clone)]
pub struct LoginCtx {
  pub app_state: AppState,
  pub email: Option<String>,
  pub password: Option<String>,
  pub user: Option<User>,
  pub token: Option<String>,
}
