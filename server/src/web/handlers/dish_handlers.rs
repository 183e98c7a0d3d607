// server/src/web/handlers/dish_handlers.rs

use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use rust_decimal::Decimal;
use serde_json::json;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{DishUpdate, NewDish};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;

#[instrument(name = "handler::list_dishes", skip(app_state))]
pub async fn list_dishes_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let dishes = app_state.dishes.list().await?;
  info!(count = dishes.len(), "Fetched dishes.");
  Ok(HttpResponse::Ok().json(dishes))
}

struct UploadedImage {
  extension: Option<String>,
  bytes: Vec<u8>,
}

#[derive(Default)]
struct DishForm {
  name: Option<String>,
  price: Option<String>,
  description: Option<String>,
  category: Option<String>,
  image: Option<UploadedImage>,
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, AppError> {
  let mut bytes = Vec::new();
  while let Some(chunk) = field
    .try_next()
    .await
    .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
  {
    if bytes.len() + chunk.len() > limit {
      return Err(AppError::Validation("Uploaded field is too large".to_string()));
    }
    bytes.extend_from_slice(&chunk);
  }
  Ok(bytes)
}

async fn read_text(field: &mut Field) -> Result<String, AppError> {
  let bytes = read_field(field, MAX_TEXT_FIELD_BYTES).await?;
  String::from_utf8(bytes).map_err(|_| AppError::Validation("Form fields must be UTF-8 text".to_string()))
}

fn safe_extension(filename: &str) -> Option<String> {
  Path::new(filename)
    .extension()
    .and_then(|ext| ext.to_str())
    .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    .map(|ext| ext.to_ascii_lowercase())
}

async fn read_dish_form(mut payload: Multipart) -> Result<DishForm, AppError> {
  let mut form = DishForm::default();
  while let Some(mut field) = payload
    .try_next()
    .await
    .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
  {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "name" => form.name = Some(read_text(&mut field).await?),
      "price" => form.price = Some(read_text(&mut field).await?),
      "description" => form.description = Some(read_text(&mut field).await?),
      "category" => form.category = Some(read_text(&mut field).await?),
      "image" => {
        let extension = field
          .content_disposition()
          .and_then(|cd| cd.get_filename())
          .and_then(safe_extension);
        let bytes = read_field(&mut field, MAX_IMAGE_BYTES).await?;
        if !bytes.is_empty() {
          form.image = Some(UploadedImage { extension, bytes });
        }
      }
      other => {
        debug!(field = other, "Ignoring unknown multipart field.");
        read_field(&mut field, MAX_IMAGE_BYTES).await?;
      }
    }
  }
  Ok(form)
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_price(raw: &str) -> Result<Decimal, AppError> {
  let price = Decimal::from_str(raw.trim()).map_err(|_| AppError::Validation("Price must be a number".to_string()))?;
  if price < Decimal::ZERO {
    return Err(AppError::Validation("Price cannot be negative".to_string()));
  }
  Ok(price)
}

async fn store_image(upload_dir: &Path, image: UploadedImage) -> Result<String, AppError> {
  tokio::fs::create_dir_all(upload_dir)
    .await
    .map_err(|e| AppError::Internal(format!("Cannot create upload directory: {}", e)))?;

  let file_name = match image.extension {
    Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
    None => Uuid::new_v4().to_string(),
  };
  tokio::fs::write(upload_dir.join(&file_name), &image.bytes)
    .await
    .map_err(|e| AppError::Internal(format!("Cannot store uploaded image: {}", e)))?;

  debug!(%file_name, size = image.bytes.len(), "Dish image stored.");
  Ok(format!("/uploads/{}", file_name))
}

#[instrument(name = "handler::create_dish", skip(app_state, payload, admin), fields(admin_id = %admin.0.id))]
pub async fn create_dish_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: Multipart,
) -> Result<HttpResponse, AppError> {
  let form = read_dish_form(payload).await?;

  let name = non_blank(form.name).ok_or_else(|| AppError::Validation("Dish name is required".to_string()))?;
  let price = form
    .price
    .as_deref()
    .map(parse_price)
    .transpose()?
    .ok_or_else(|| AppError::Validation("Dish price is required".to_string()))?;

  let image_url = match form.image {
    Some(image) => Some(store_image(&app_state.config.upload_dir, image).await?),
    None => None,
  };

  let dish = app_state
    .dishes
    .insert(NewDish {
      name,
      price,
      description: non_blank(form.description),
      category: non_blank(form.category),
      image_url,
    })
    .await?;

  info!(dish_id = %dish.id, name = %dish.name, "Dish created.");
  Ok(HttpResponse::Created().json(dish))
}

#[instrument(name = "handler::update_dish", skip(app_state, path, req_payload, _admin), fields(dish_id = %path.as_ref()))]
pub async fn update_dish_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<DishUpdate>,
) -> Result<HttpResponse, AppError> {
  let dish_id = path.into_inner();
  let update = req_payload.into_inner();

  if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
    return Err(AppError::Validation("Dish name cannot be blank".to_string()));
  }
  if update.price.is_some_and(|p| p < Decimal::ZERO) {
    return Err(AppError::Validation("Price cannot be negative".to_string()));
  }

  match app_state.dishes.update(dish_id, update).await? {
    Some(dish) => {
      info!(%dish_id, "Dish updated.");
      Ok(HttpResponse::Ok().json(dish))
    }
    None => {
      warn!(%dish_id, "Update requested for unknown dish.");
      Err(AppError::NotFound("Dish not found".to_string()))
    }
  }
}

#[instrument(name = "handler::delete_dish", skip(app_state, path, _admin), fields(dish_id = %path.as_ref()))]
pub async fn delete_dish_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let dish_id = path.into_inner();
  if !app_state.dishes.delete(dish_id).await? {
    return Err(AppError::NotFound("Dish not found".to_string()));
  }
  info!(%dish_id, "Dish deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Dish deleted" })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extension_is_sanitised() {
    assert_eq!(safe_extension("paneer.JPG").as_deref(), Some("jpg"));
    assert_eq!(safe_extension("noext"), None);
    assert_eq!(safe_extension("evil.p/hp"), None);
    assert_eq!(safe_extension("../../etc/passwd.sh;rm"), None);
  }

  #[test]
  fn price_parsing() {
    assert_eq!(parse_price(" 120.50 ").unwrap(), Decimal::new(12050, 2));
    assert!(matches!(parse_price("-1"), Err(AppError::Validation(_))));
    assert!(matches!(parse_price("cheap"), Err(AppError::Validation(_))));
  }
}
