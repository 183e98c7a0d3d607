// baattak/server/src/repositories/mod.rs

//! Persistence seams. Handlers and flows only see these traits; `PgStore`
//! and `MemoryStore` provide the two implementations.

use crate::errors::Result;
use crate::models::{Cart, CartStatus, Dish, DishUpdate, NewCart, NewDish, NewUser, OrderHistory, ProfileUpdate, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod memory;
pub mod postgres;

/// Client message when a profile edit collides with another account's email.
pub const EMAIL_IN_USE: &str = "Email already in use by another user.";

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait DishRepository: Send + Sync {
  /// All dishes ordered by category, then name.
  async fn list(&self) -> Result<Vec<Dish>>;
  async fn insert(&self, dish: NewDish) -> Result<Dish>;
  async fn update(&self, id: Uuid, update: DishUpdate) -> Result<Option<Dish>>;
  async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
  async fn insert(&self, cart: NewCart) -> Result<Cart>;
  /// Newest first.
  async fn list(&self) -> Result<Vec<Cart>>;
  /// The most recent cart submitted under this customer name.
  async fn find_by_customer(&self, user: &str) -> Result<Option<Cart>>;
  async fn set_status(&self, id: Uuid, status: CartStatus) -> Result<Option<Cart>>;
  async fn delete(&self, id: Uuid) -> Result<bool>;
  /// Copies the cart into history and removes it in one atomic unit.
  /// `None` means the cart did not exist and nothing was written.
  async fn archive(&self, id: Uuid) -> Result<Option<OrderHistory>>;
  /// Ids of carts created strictly before `cutoff`, oldest first.
  async fn list_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>>;
  /// Carts created at or after `since`, newest first, at most `limit`.
  async fn list_created_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Cart>>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
  /// Newest archive first.
  async fn list(&self) -> Result<Vec<OrderHistory>>;
  /// Orders whose originating cart was created at or after `since`.
  async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<OrderHistory>>;
  async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
  async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
  /// Any user sharing the username, phone number or email.
  async fn find_conflict(&self, username: &str, phone_number: &str, email: &str) -> Result<Option<User>>;
  async fn insert(&self, user: NewUser) -> Result<User>;
  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>>;
  /// Finishes registration: optionally replaces the password hash and
  /// profile fields, and clears both OTP fields.
  async fn set_password_and_clear_otp(
    &self,
    id: Uuid,
    password_hash: Option<String>,
    profile: ProfileUpdate,
  ) -> Result<Option<User>>;
  async fn delete(&self, id: Uuid) -> Result<bool>;
  async fn list(&self) -> Result<Vec<User>>;
  async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64>;
}
