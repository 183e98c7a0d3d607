// baattak/server/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use baattak_flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  /// Login attempted before the email OTP was confirmed.
  #[error("Account Not Verified: {0}")]
  Unverified(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Invalid Token: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Mail Delivery Error: {0}")]
  Mail(#[from] lettre::transport::smtp::Error),

  #[error("Flow Error: {source}")]
  Flow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Message placed in the `{"error": ...}` body. Server-side failures get a
  /// generic text; their details only go to the log.
  fn client_message(&self) -> String {
    match self {
      AppError::Validation(m)
      | AppError::Unverified(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m) => m.clone(),
      AppError::Token(_) => "Invalid or expired token.".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Sqlx(_) | AppError::Migrate(_) => "Database operation failed".to_string(),
      AppError::Mail(_) => "Failed to send email".to_string(),
      AppError::Flow { .. } => "Workflow processing error".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::Unverified(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) | AppError::Token(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Migrate(_)
      | AppError::Mail(_)
      | AppError::Flow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::debug!(application_error = %self, "Responding with client error");
    }
    HttpResponse::build(status).json(json!({"error": self.client_message()}))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
