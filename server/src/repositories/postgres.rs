// baattak/server/src/repositories/postgres.rs

use super::{CartRepository, DishRepository, HistoryRepository, UserRepository, EMAIL_IN_USE};
use crate::errors::{AppError, Result};
use crate::models::{Cart, CartStatus, Dish, DishUpdate, NewCart, NewDish, NewUser, OrderHistory, ProfileUpdate, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const DISH_COLUMNS: &str = "id, name, price, description, category, image_url, created_at, updated_at";
const CART_COLUMNS: &str =
  "id, customer_name, phone_number, items, total_quantity, total_price, status, created_at, updated_at";
const HISTORY_COLUMNS: &str =
  "id, cart_id, customer_name, phone_number, items, total_quantity, total_price, created_at, archived_at";
const USER_COLUMNS: &str =
  "id, username, phone_number, email, password_hash, otp, otp_expires, is_admin, created_at, updated_at";

/// Turns a violation of `users.email UNIQUE` into a client error.
fn email_conflict(err: sqlx::Error) -> AppError {
  match &err {
    sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Validation(EMAIL_IN_USE.to_string()),
    _ => AppError::from(err),
  }
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  #[instrument(name = "PgStore::connect", skip(database_url), err(Display))]
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    info!("Successfully connected to the database.");
    Ok(Self::new(pool))
  }

  #[instrument(name = "PgStore::migrate", skip(self), err(Display))]
  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }
}

#[async_trait]
impl DishRepository for PgStore {
  async fn list(&self) -> Result<Vec<Dish>> {
    let dishes = sqlx::query_as::<_, Dish>(&format!(
      "SELECT {DISH_COLUMNS} FROM dishes ORDER BY category ASC NULLS LAST, name ASC"
    ))
    .fetch_all(&self.pool)
    .await?;
    Ok(dishes)
  }

  async fn insert(&self, dish: NewDish) -> Result<Dish> {
    let now = Utc::now();
    let dish = sqlx::query_as::<_, Dish>(&format!(
      "INSERT INTO dishes (id, name, price, description, category, image_url, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {DISH_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&dish.name)
    .bind(dish.price)
    .bind(&dish.description)
    .bind(&dish.category)
    .bind(&dish.image_url)
    .bind(now)
    .fetch_one(&self.pool)
    .await?;
    Ok(dish)
  }

  async fn update(&self, id: Uuid, update: DishUpdate) -> Result<Option<Dish>> {
    let dish = sqlx::query_as::<_, Dish>(&format!(
      "UPDATE dishes SET \
         name = COALESCE($2, name), \
         price = COALESCE($3, price), \
         description = COALESCE($4, description), \
         category = COALESCE($5, category), \
         image_url = COALESCE($6, image_url), \
         updated_at = $7 \
       WHERE id = $1 RETURNING {DISH_COLUMNS}"
    ))
    .bind(id)
    .bind(&update.name)
    .bind(update.price)
    .bind(&update.description)
    .bind(&update.category)
    .bind(&update.image_url)
    .bind(Utc::now())
    .fetch_optional(&self.pool)
    .await?;
    Ok(dish)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM dishes WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl CartRepository for PgStore {
  async fn insert(&self, cart: NewCart) -> Result<Cart> {
    let now = Utc::now();
    let cart = sqlx::query_as::<_, Cart>(&format!(
      "INSERT INTO carts (id, customer_name, phone_number, items, total_quantity, total_price, status, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {CART_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&cart.user)
    .bind(&cart.phone_number)
    .bind(Json(&cart.items))
    .bind(cart.total_quantity)
    .bind(cart.total_price)
    .bind(CartStatus::New)
    .bind(now)
    .fetch_one(&self.pool)
    .await?;
    Ok(cart)
  }

  async fn list(&self) -> Result<Vec<Cart>> {
    let carts = sqlx::query_as::<_, Cart>(&format!("SELECT {CART_COLUMNS} FROM carts ORDER BY created_at DESC"))
      .fetch_all(&self.pool)
      .await?;
    Ok(carts)
  }

  async fn find_by_customer(&self, user: &str) -> Result<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
      "SELECT {CART_COLUMNS} FROM carts WHERE customer_name = $1 ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(user)
    .fetch_optional(&self.pool)
    .await?;
    Ok(cart)
  }

  async fn set_status(&self, id: Uuid, status: CartStatus) -> Result<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
      "UPDATE carts SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {CART_COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .bind(Utc::now())
    .fetch_optional(&self.pool)
    .await?;
    Ok(cart)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM carts WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "PgStore::archive", skip(self), err(Display))]
  async fn archive(&self, id: Uuid) -> Result<Option<OrderHistory>> {
    let mut tx = self.pool.begin().await?;

    // The row lock taken by DELETE serialises concurrent archives of one cart.
    let removed = sqlx::query_as::<_, Cart>(&format!("DELETE FROM carts WHERE id = $1 RETURNING {CART_COLUMNS}"))
      .bind(id)
      .fetch_optional(&mut *tx)
      .await?;
    let Some(cart) = removed else {
      tx.rollback().await?;
      debug!("Cart already gone, nothing archived.");
      return Ok(None);
    };

    let order = OrderHistory::from_cart(cart, Utc::now());
    let order = sqlx::query_as::<_, OrderHistory>(&format!(
      "INSERT INTO order_history (id, cart_id, customer_name, phone_number, items, total_quantity, total_price, created_at, archived_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {HISTORY_COLUMNS}"
    ))
    .bind(order.id)
    .bind(order.cart_id)
    .bind(&order.user)
    .bind(&order.phone_number)
    .bind(Json(&order.items))
    .bind(order.total_quantity)
    .bind(order.total_price)
    .bind(order.created_at)
    .bind(order.archived_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(order))
  }

  async fn list_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM carts WHERE created_at < $1 ORDER BY created_at ASC")
      .bind(cutoff)
      .fetch_all(&self.pool)
      .await?;
    Ok(ids)
  }

  async fn list_created_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Cart>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let carts = sqlx::query_as::<_, Cart>(&format!(
      "SELECT {CART_COLUMNS} FROM carts WHERE created_at >= $1 ORDER BY created_at DESC LIMIT $2"
    ))
    .bind(since)
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;
    Ok(carts)
  }
}

#[async_trait]
impl HistoryRepository for PgStore {
  async fn list(&self) -> Result<Vec<OrderHistory>> {
    let orders = sqlx::query_as::<_, OrderHistory>(&format!(
      "SELECT {HISTORY_COLUMNS} FROM order_history ORDER BY archived_at DESC"
    ))
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
  }

  async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<OrderHistory>> {
    let orders = sqlx::query_as::<_, OrderHistory>(&format!(
      "SELECT {HISTORY_COLUMNS} FROM order_history WHERE created_at >= $1 ORDER BY created_at DESC"
    ))
    .bind(since)
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
  }

  async fn count(&self) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_history")
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }
}

#[async_trait]
impl UserRepository for PgStore {
  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
      .bind(email)
      .fetch_optional(&self.pool)
      .await?;
    Ok(user)
  }

  async fn find_conflict(&self, username: &str, phone_number: &str, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
      "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR phone_number = $2 OR email = $3 LIMIT 1"
    ))
    .bind(username)
    .bind(phone_number)
    .bind(email)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }

  async fn insert(&self, user: NewUser) -> Result<User> {
    let now = Utc::now();
    let user = sqlx::query_as::<_, User>(&format!(
      "INSERT INTO users (id, username, phone_number, email, password_hash, otp, otp_expires, is_admin, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&user.username)
    .bind(&user.phone_number)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.otp)
    .bind(user.otp_expires)
    .bind(user.is_admin)
    .bind(now)
    .fetch_one(&self.pool)
    .await?;
    Ok(user)
  }

  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
      "UPDATE users SET \
         username = COALESCE($2, username), \
         email = COALESCE($3, email), \
         phone_number = COALESCE($4, phone_number), \
         updated_at = $5 \
       WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(&update.username)
    .bind(&update.email)
    .bind(&update.phone_number)
    .bind(Utc::now())
    .fetch_optional(&self.pool)
    .await
    .map_err(email_conflict)?;
    Ok(user)
  }

  async fn set_password_and_clear_otp(
    &self,
    id: Uuid,
    password_hash: Option<String>,
    profile: ProfileUpdate,
  ) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
      "UPDATE users SET \
         password_hash = COALESCE($2, password_hash), \
         username = COALESCE($3, username), \
         phone_number = COALESCE($4, phone_number), \
         otp = NULL, \
         otp_expires = NULL, \
         updated_at = $5 \
       WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(&password_hash)
    .bind(&profile.username)
    .bind(&profile.phone_number)
    .bind(Utc::now())
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list(&self) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"))
      .fetch_all(&self.pool)
      .await?;
    Ok(users)
  }

  async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE created_at >= $1")
      .bind(since)
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }
}
