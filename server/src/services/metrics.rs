// baattak/server/src/services/metrics.rs

//! Sales figures for the admin dashboard. Day boundaries are UTC.

use crate::errors::Result as AppResult;
use crate::models::{Cart, OrderHistory};
use crate::repositories::{CartRepository, HistoryRepository, UserRepository};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::instrument;

pub const RECENT_ORDERS_LIMIT: usize = 10;
pub const POPULAR_ITEMS_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopularItem {
  pub name: String,
  pub quantity: i64,
  pub total_revenue: Decimal,
}

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
  now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn one_week_before(now: DateTime<Utc>) -> DateTime<Utc> {
  now - Duration::days(7)
}

/// Revenue of archived orders whose cart was submitted today.
#[instrument(name = "metrics::today_revenue", skip(history))]
pub async fn today_revenue(history: &dyn HistoryRepository, now: DateTime<Utc>) -> AppResult<Decimal> {
  let orders = history.list_since(start_of_day(now)).await?;
  Ok(orders.iter().map(|o| o.total_price).sum())
}

pub async fn total_orders(history: &dyn HistoryRepository) -> AppResult<i64> {
  history.count().await
}

pub async fn users_last_week(users: &dyn UserRepository, now: DateTime<Utc>) -> AppResult<i64> {
  users.count_created_since(one_week_before(now)).await
}

/// Mean order total over the last seven days, two decimal places, zero when
/// there were no orders.
#[instrument(name = "metrics::avg_order_value_last_week", skip(history))]
pub async fn avg_order_value_last_week(history: &dyn HistoryRepository, now: DateTime<Utc>) -> AppResult<Decimal> {
  let orders = history.list_since(one_week_before(now)).await?;
  Ok(average_total(&orders))
}

fn average_total(orders: &[OrderHistory]) -> Decimal {
  if orders.is_empty() {
    return Decimal::ZERO;
  }
  let sum: Decimal = orders.iter().map(|o| o.total_price).sum();
  (sum / Decimal::from(orders.len())).round_dp(2)
}

pub async fn recent_orders_today(carts: &dyn CartRepository, now: DateTime<Utc>) -> AppResult<Vec<Cart>> {
  carts.list_created_since(start_of_day(now), RECENT_ORDERS_LIMIT).await
}

#[instrument(name = "metrics::popular_items", skip(history))]
pub async fn popular_items(history: &dyn HistoryRepository) -> AppResult<Vec<PopularItem>> {
  let orders = history.list().await?;
  Ok(rank_items(&orders))
}

fn rank_items(orders: &[OrderHistory]) -> Vec<PopularItem> {
  let mut totals: HashMap<&str, (i64, Decimal)> = HashMap::new();
  for item in orders.iter().flat_map(|o| o.items.iter()) {
    let entry = totals.entry(item.name.as_str()).or_insert((0, Decimal::ZERO));
    entry.0 += i64::from(item.quantity);
    entry.1 += item.price * Decimal::from(item.quantity);
  }

  let mut ranked: Vec<PopularItem> = totals
    .into_iter()
    .map(|(name, (quantity, total_revenue))| PopularItem {
      name: name.to_string(),
      quantity,
      total_revenue,
    })
    .collect();
  ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
  ranked.truncate(POPULAR_ITEMS_LIMIT);
  ranked
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::LineItem;
  use crate::repositories::MemoryStore;
  use chrono::TimeZone;
  use std::str::FromStr;
  use uuid::Uuid;

  fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
  }

  fn order(created_at: DateTime<Utc>, total: &str, items: &[(&str, i32, &str)]) -> OrderHistory {
    OrderHistory {
      id: Uuid::new_v4(),
      cart_id: Uuid::new_v4(),
      user: "Asha".into(),
      phone_number: "9876543210".into(),
      items: items
        .iter()
        .map(|(name, quantity, price)| LineItem {
          name: name.to_string(),
          quantity: *quantity,
          price: dec(price),
        })
        .collect(),
      total_quantity: items.iter().map(|(_, q, _)| *q).sum(),
      total_price: dec(total),
      created_at,
      archived_at: created_at,
    }
  }

  fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
  }

  #[test]
  fn start_of_day_truncates_to_midnight() {
    assert_eq!(start_of_day(noon()), Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
  }

  #[tokio::test]
  async fn revenue_counts_only_today() {
    let store = MemoryStore::new();
    store.seed_history(order(noon() - Duration::hours(1), "47.20", &[]));
    store.seed_history(order(noon() - Duration::hours(2), "10.00", &[]));
    store.seed_history(order(noon() - Duration::days(1), "99.00", &[]));

    assert_eq!(today_revenue(&store, noon()).await.unwrap(), dec("57.20"));
    assert_eq!(total_orders(&store).await.unwrap(), 3);
  }

  #[tokio::test]
  async fn weekly_average_rounds_to_cents() {
    let store = MemoryStore::new();
    assert_eq!(avg_order_value_last_week(&store, noon()).await.unwrap(), Decimal::ZERO);

    store.seed_history(order(noon() - Duration::days(1), "10.00", &[]));
    store.seed_history(order(noon() - Duration::days(2), "10.00", &[]));
    store.seed_history(order(noon() - Duration::days(3), "10.01", &[]));
    store.seed_history(order(noon() - Duration::days(8), "500.00", &[]));

    assert_eq!(avg_order_value_last_week(&store, noon()).await.unwrap(), dec("10.00"));
  }

  #[test]
  fn popular_items_rank_by_quantity_then_name() {
    let orders = vec![
      order(noon(), "0", &[("Tea", 2, "20"), ("Samosa", 3, "15")]),
      order(noon(), "0", &[("Tea", 1, "20"), ("Chai Latte", 3, "40")]),
      order(noon(), "0", &[("Dal", 1, "80"), ("Roti", 1, "10"), ("Lassi", 1, "35"), ("Kheer", 1, "50")]),
    ];

    let ranked = rank_items(&orders);
    let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Chai Latte", "Samosa", "Tea", "Dal", "Kheer"]);
    assert_eq!(ranked[2].quantity, 3);
    assert_eq!(ranked[2].total_revenue, dec("60"));
  }
}
