// baattak/server/src/repositories/memory.rs

use super::{CartRepository, DishRepository, HistoryRepository, UserRepository, EMAIL_IN_USE};
use crate::errors::{AppError, Result};
use crate::models::{Cart, CartStatus, Dish, DishUpdate, NewCart, NewDish, NewUser, OrderHistory, ProfileUpdate, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
  dishes: Vec<Dish>,
  carts: Vec<Cart>,
  history: Vec<OrderHistory>,
  users: Vec<User>,
}

/// In-process store behind one lock, so every operation (archive included)
/// is atomic with respect to the others. Vectors keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Collections>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts a cart with a caller-chosen creation time.
  pub fn seed_cart(&self, cart: NewCart, created_at: DateTime<Utc>) -> Cart {
    let cart = Cart {
      id: Uuid::new_v4(),
      user: cart.user,
      phone_number: cart.phone_number,
      items: cart.items,
      total_quantity: cart.total_quantity,
      total_price: cart.total_price,
      status: CartStatus::New,
      created_at,
      updated_at: created_at,
    };
    self.inner.lock().carts.push(cart.clone());
    cart
  }

  pub fn seed_history(&self, order: OrderHistory) {
    self.inner.lock().history.push(order);
  }

  pub fn seed_user(&self, user: User) {
    self.inner.lock().users.push(user);
  }

  pub fn cart_count(&self) -> usize {
    self.inner.lock().carts.len()
  }

  pub fn history_count(&self) -> usize {
    self.inner.lock().history.len()
  }

  /// Pending OTP for `email`, if registration has not been confirmed.
  pub fn pending_otp(&self, email: &str) -> Option<String> {
    self
      .inner
      .lock()
      .users
      .iter()
      .find(|u| u.email == email)
      .and_then(|u| u.otp.clone())
  }
}

fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
  let mut out: Vec<T> = items.iter().rev().cloned().collect();
  out.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
  out
}

#[async_trait]
impl DishRepository for MemoryStore {
  async fn list(&self) -> Result<Vec<Dish>> {
    let mut dishes = self.inner.lock().dishes.clone();
    // Uncategorised dishes go last, matching `NULLS LAST` in Postgres.
    dishes.sort_by(|a, b| {
      (a.category.is_none(), &a.category, &a.name).cmp(&(b.category.is_none(), &b.category, &b.name))
    });
    Ok(dishes)
  }

  async fn insert(&self, dish: NewDish) -> Result<Dish> {
    let now = Utc::now();
    let dish = Dish {
      id: Uuid::new_v4(),
      name: dish.name,
      price: dish.price,
      description: dish.description,
      category: dish.category,
      image_url: dish.image_url,
      created_at: now,
      updated_at: now,
    };
    self.inner.lock().dishes.push(dish.clone());
    Ok(dish)
  }

  async fn update(&self, id: Uuid, update: DishUpdate) -> Result<Option<Dish>> {
    let mut inner = self.inner.lock();
    let Some(dish) = inner.dishes.iter_mut().find(|d| d.id == id) else {
      return Ok(None);
    };
    update.apply_to(dish);
    dish.updated_at = Utc::now();
    Ok(Some(dish.clone()))
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let mut inner = self.inner.lock();
    let before = inner.dishes.len();
    inner.dishes.retain(|d| d.id != id);
    Ok(inner.dishes.len() != before)
  }
}

#[async_trait]
impl CartRepository for MemoryStore {
  async fn insert(&self, cart: NewCart) -> Result<Cart> {
    Ok(self.seed_cart(cart, Utc::now()))
  }

  async fn list(&self) -> Result<Vec<Cart>> {
    Ok(newest_first(&self.inner.lock().carts, |c| c.created_at))
  }

  async fn find_by_customer(&self, user: &str) -> Result<Option<Cart>> {
    let inner = self.inner.lock();
    let matching: Vec<Cart> = inner.carts.iter().filter(|c| c.user == user).cloned().collect();
    Ok(newest_first(&matching, |c| c.created_at).into_iter().next())
  }

  async fn set_status(&self, id: Uuid, status: CartStatus) -> Result<Option<Cart>> {
    let mut inner = self.inner.lock();
    let Some(cart) = inner.carts.iter_mut().find(|c| c.id == id) else {
      return Ok(None);
    };
    cart.status = status;
    cart.updated_at = Utc::now();
    Ok(Some(cart.clone()))
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let mut inner = self.inner.lock();
    let before = inner.carts.len();
    inner.carts.retain(|c| c.id != id);
    Ok(inner.carts.len() != before)
  }

  async fn archive(&self, id: Uuid) -> Result<Option<OrderHistory>> {
    let mut inner = self.inner.lock();
    let Some(position) = inner.carts.iter().position(|c| c.id == id) else {
      return Ok(None);
    };
    let cart = inner.carts.remove(position);
    let order = OrderHistory::from_cart(cart, Utc::now());
    inner.history.push(order.clone());
    Ok(Some(order))
  }

  async fn list_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>> {
    let inner = self.inner.lock();
    let mut stale: Vec<&Cart> = inner.carts.iter().filter(|c| c.created_at < cutoff).collect();
    stale.sort_by_key(|c| c.created_at);
    Ok(stale.into_iter().map(|c| c.id).collect())
  }

  async fn list_created_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Cart>> {
    let inner = self.inner.lock();
    let recent: Vec<Cart> = inner.carts.iter().filter(|c| c.created_at >= since).cloned().collect();
    Ok(newest_first(&recent, |c| c.created_at).into_iter().take(limit).collect())
  }
}

#[async_trait]
impl HistoryRepository for MemoryStore {
  async fn list(&self) -> Result<Vec<OrderHistory>> {
    Ok(newest_first(&self.inner.lock().history, |o| o.archived_at))
  }

  async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<OrderHistory>> {
    Ok(
      self
        .inner
        .lock()
        .history
        .iter()
        .filter(|o| o.created_at >= since)
        .cloned()
        .collect(),
    )
  }

  async fn count(&self) -> Result<i64> {
    i64::try_from(self.inner.lock().history.len()).map_err(|e| AppError::Internal(e.to_string()))
  }
}

#[async_trait]
impl UserRepository for MemoryStore {
  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(self.inner.lock().users.iter().find(|u| u.email == email).cloned())
  }

  async fn find_conflict(&self, username: &str, phone_number: &str, email: &str) -> Result<Option<User>> {
    Ok(
      self
        .inner
        .lock()
        .users
        .iter()
        .find(|u| u.username == username || u.phone_number == phone_number || u.email == email)
        .cloned(),
    )
  }

  async fn insert(&self, user: NewUser) -> Result<User> {
    let mut inner = self.inner.lock();
    if inner.users.iter().any(|u| u.email == user.email) {
      return Err(AppError::Validation("Email already registered.".to_string()));
    }
    let now = Utc::now();
    let user = User {
      id: Uuid::new_v4(),
      username: user.username,
      phone_number: user.phone_number,
      email: user.email,
      password_hash: user.password_hash,
      otp: user.otp,
      otp_expires: user.otp_expires,
      is_admin: user.is_admin,
      created_at: now,
      updated_at: now,
    };
    inner.users.push(user.clone());
    Ok(user)
  }

  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
    let mut inner = self.inner.lock();
    if let Some(email) = update.email.as_deref() {
      if inner.users.iter().any(|u| u.id != id && u.email == email) {
        return Err(AppError::Validation(EMAIL_IN_USE.to_string()));
      }
    }
    let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
      return Ok(None);
    };
    update.apply_to(user);
    user.updated_at = Utc::now();
    Ok(Some(user.clone()))
  }

  async fn set_password_and_clear_otp(
    &self,
    id: Uuid,
    password_hash: Option<String>,
    profile: ProfileUpdate,
  ) -> Result<Option<User>> {
    let mut inner = self.inner.lock();
    let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
      return Ok(None);
    };
    if let Some(hash) = password_hash {
      user.password_hash = hash;
    }
    profile.apply_to(user);
    user.otp = None;
    user.otp_expires = None;
    user.updated_at = Utc::now();
    Ok(Some(user.clone()))
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let mut inner = self.inner.lock();
    let before = inner.users.len();
    inner.users.retain(|u| u.id != id);
    Ok(inner.users.len() != before)
  }

  async fn list(&self) -> Result<Vec<User>> {
    Ok(self.inner.lock().users.clone())
  }

  async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
    let count = self.inner.lock().users.iter().filter(|u| u.created_at >= since).count();
    i64::try_from(count).map_err(|e| AppError::Internal(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;

  fn tea_order(user: &str) -> NewCart {
    NewCart {
      user: user.to_string(),
      phone_number: "9876543210".to_string(),
      items: vec![],
      total_quantity: 0,
      total_price: Decimal::ZERO,
    }
  }

  #[tokio::test]
  async fn archive_moves_cart_exactly_once() {
    let store = MemoryStore::new();
    let cart = CartRepository::insert(&store, tea_order("Asha")).await.unwrap();

    let order = store.archive(cart.id).await.unwrap().expect("archived");
    assert_eq!(order.cart_id, cart.id);
    assert_eq!(order.created_at, cart.created_at);
    assert_eq!(store.cart_count(), 0);
    assert_eq!(store.history_count(), 1);

    assert!(store.archive(cart.id).await.unwrap().is_none());
    assert_eq!(store.history_count(), 1);
  }

  #[tokio::test]
  async fn customer_lookup_returns_newest_cart() {
    let store = MemoryStore::new();
    let now = Utc::now();
    store.seed_cart(tea_order("Ravi"), now - chrono::Duration::minutes(10));
    let newer = store.seed_cart(tea_order("Ravi"), now);

    let found = store.find_by_customer("Ravi").await.unwrap().unwrap();
    assert_eq!(found.id, newer.id);
    assert!(store.find_by_customer("Nobody").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn stale_selection_uses_strict_cutoff() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let old = store.seed_cart(tea_order("a"), now - chrono::Duration::minutes(6));
    store.seed_cart(tea_order("b"), now);

    let stale = store.list_created_before(now - chrono::Duration::minutes(5)).await.unwrap();
    assert_eq!(stale, vec![old.id]);
  }

  #[tokio::test]
  async fn dishes_sort_by_category_then_name() {
    let store = MemoryStore::new();
    for (name, category) in [("Samosa", "Snacks"), ("Dal", "Lunch"), ("Chai", "Snacks")] {
      DishRepository::insert(
        &store,
        NewDish {
          name: name.to_string(),
          price: Decimal::new(50, 0),
          description: None,
          category: Some(category.to_string()),
          image_url: None,
        },
      )
      .await
      .unwrap();
    }

    let names: Vec<String> = DishRepository::list(&store).await.unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["Dal", "Chai", "Samosa"]);
  }

  fn verified_user(email: &str, phone_number: &str) -> NewUser {
    NewUser {
      username: email.to_string(),
      phone_number: phone_number.to_string(),
      email: email.to_string(),
      password_hash: String::new(),
      otp: None,
      otp_expires: None,
      is_admin: false,
    }
  }

  #[tokio::test]
  async fn profile_edit_cannot_take_another_users_email() {
    let store = MemoryStore::new();
    UserRepository::insert(&store, verified_user("asha@example.com", "9000000001")).await.unwrap();
    let ravi = UserRepository::insert(&store, verified_user("ravi@example.com", "9000000002")).await.unwrap();

    let clash = ProfileUpdate {
      email: Some("asha@example.com".into()),
      ..ProfileUpdate::default()
    };
    let err = store.update_profile(ravi.id, clash).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == EMAIL_IN_USE));
    assert_eq!(store.find_by_email("ravi@example.com").await.unwrap().map(|u| u.id), Some(ravi.id));

    let own = ProfileUpdate {
      email: Some("ravi@example.com".into()),
      ..ProfileUpdate::default()
    };
    assert!(store.update_profile(ravi.id, own).await.unwrap().is_some());
  }
}
