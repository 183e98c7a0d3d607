// baattak/server/src/models/dish.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
  pub id: Uuid,
  pub name: String,
  pub price: Decimal,
  pub description: Option<String>,
  pub category: Option<String>,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDish {
  pub name: String,
  pub price: Decimal,
  pub description: Option<String>,
  pub category: Option<String>,
  pub image_url: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishUpdate {
  pub name: Option<String>,
  pub price: Option<Decimal>,
  pub description: Option<String>,
  pub category: Option<String>,
  pub image_url: Option<String>,
}

impl DishUpdate {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.price.is_none()
      && self.description.is_none()
      && self.category.is_none()
      && self.image_url.is_none()
  }

  pub fn apply_to(&self, dish: &mut Dish) {
    if let Some(name) = &self.name {
      dish.name = name.clone();
    }
    if let Some(price) = self.price {
      dish.price = price;
    }
    if let Some(description) = &self.description {
      dish.description = Some(description.clone());
    }
    if let Some(category) = &self.category {
      dish.category = Some(category.clone());
    }
    if let Some(image_url) = &self.image_url {
      dish.image_url = Some(image_url.clone());
    }
  }
}
