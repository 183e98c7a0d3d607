// server/src/web/mod.rs

pub mod extractors;
pub mod handlers;
pub mod routes;

use actix_cors::Cors;
use actix_web::{error::JsonPayloadError, http::header, web, HttpRequest};

use crate::config::AppConfig;
use crate::errors::AppError;

pub use routes::configure_app_routes;

/// Malformed JSON bodies get the same `{"error": ...}` shape as every other
/// client error.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
    AppError::Validation(format!("Invalid JSON body: {}", err)).into()
  })
}

pub fn cors(config: &AppConfig) -> Cors {
  config
    .cors_allowed_origins
    .iter()
    .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
    .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
    .supports_credentials()
    .max_age(3600)
}
