// tests/metrics_api_tests.rs

mod common;

use actix_web::test;
use baattak_server::models::{LineItem, NewCart, OrderHistory, User};
use chrono::{DateTime, Duration, Utc};
use common::{init_app, TestContext};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

fn dec(v: &Value) -> Decimal {
  match v {
    Value::String(s) => Decimal::from_str(s).unwrap(),
    other => Decimal::from_str(&other.to_string()).unwrap(),
  }
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
        price: Decimal::from_str(price).unwrap(),
      })
      .collect(),
    total_quantity: items.iter().map(|(_, q, _)| *q).sum(),
    total_price: Decimal::from_str(total).unwrap(),
    created_at,
    archived_at: created_at + Duration::minutes(30),
  }
}

fn seed_sales(tc: &TestContext) {
  let now = Utc::now();
  tc.store.seed_history(order(now, "47.20", &[("Tea", 2, "20")]));
  tc.store.seed_history(order(now, "30", &[("Samosa", 1, "15"), ("Tea", 1, "15")]));
  tc.store.seed_history(order(now - Duration::days(3), "22.80", &[("Samosa", 3, "5")]));
  tc.store.seed_history(order(now - Duration::days(10), "100", &[("Thali", 1, "100")]));
}

macro_rules! get_json {
  ($app:expr, $uri:expr) => {
    test::call_and_read_body_json::<_, _, Value>(&$app, test::TestRequest::get().uri($uri).to_request())
  };
}

#[actix_web::test]
async fn revenue_and_order_totals() {
  let tc = TestContext::new();
  seed_sales(&tc);
  let app = init_app!(tc.state);

  let body = get_json!(app, "/api/v1/customer/today-revenue").await;
  assert_eq!(dec(&body["totalRevenueToday"]), Decimal::from_str("77.20").unwrap());

  let body = get_json!(app, "/api/v1/customer/total-orders").await;
  assert_eq!(body["totalOrders"], 4);

  let body = get_json!(app, "/api/v1/customer/avg-order-value-inweek").await;
  assert_eq!(dec(&body["avgOrderValueLastWeek"]), Decimal::from_str("33.33").unwrap());

  let body = get_json!(app, "/api/v1/customer/orderHistories").await;
  assert_eq!(body.as_array().unwrap().len(), 4);
}

#[actix_web::test]
async fn metrics_are_zero_without_sales() {
  let tc = TestContext::new();
  let app = init_app!(tc.state);

  let body = get_json!(app, "/api/v1/customer/today-revenue").await;
  assert_eq!(dec(&body["totalRevenueToday"]), Decimal::ZERO);
  let body = get_json!(app, "/api/v1/customer/avg-order-value-inweek").await;
  assert_eq!(dec(&body["avgOrderValueLastWeek"]), Decimal::ZERO);
  let body = get_json!(app, "/api/v1/customer/popular-items").await;
  assert!(body.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn popular_items_rank_by_quantity() {
  let tc = TestContext::new();
  seed_sales(&tc);
  let app = init_app!(tc.state);

  let body = get_json!(app, "/api/v1/customer/popular-items").await;
  let items = body.as_array().unwrap();
  let names: Vec<&str> = items.iter().map(|i| i["name"].as_str().unwrap()).collect();
  assert_eq!(names, ["Samosa", "Tea", "Thali"]);
  assert_eq!(items[0]["quantity"], 4);
  assert_eq!(dec(&items[0]["totalRevenue"]), Decimal::from(30));
  assert_eq!(dec(&items[1]["totalRevenue"]), Decimal::from(55));
}

#[actix_web::test]
async fn user_count_covers_the_last_week() {
  let tc = TestContext::new();
  let long_ago = Utc::now() - Duration::days(30);
  tc.store.seed_user(User {
    id: Uuid::new_v4(),
    username: "veteran".into(),
    phone_number: "9111111111".into(),
    email: "veteran@example.com".into(),
    password_hash: String::new(),
    otp: None,
    otp_expires: None,
    is_admin: false,
    created_at: long_ago,
    updated_at: long_ago,
  });
  tc.user_with_token("new@example.com", "pw", false).await;
  let app = init_app!(tc.state);

  let body = get_json!(app, "/api/v1/customer/usercount").await;
  assert_eq!(body["count"], 1);
}

#[actix_web::test]
async fn recent_orders_only_include_today() {
  let tc = TestContext::new();
  let now = Utc::now();
  let cart = |user: &str| NewCart {
    user: user.to_string(),
    phone_number: "9876543210".to_string(),
    items: vec![],
    total_quantity: 0,
    total_price: Decimal::ZERO,
  };
  tc.store.seed_cart(cart("Yesterday"), now - Duration::days(2));
  let earlier = tc.store.seed_cart(cart("Earlier"), now - Duration::milliseconds(5));
  let latest = tc.store.seed_cart(cart("Latest"), now);
  let app = init_app!(tc.state);

  let body = get_json!(app, "/api/v1/customer/recent-orders-today").await;
  let ids: Vec<&str> = body.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
  assert_eq!(ids, vec![latest.id.to_string(), earlier.id.to_string()]);
}
