// server/src/web/extractors.rs

//! Request guards for token-protected endpoints.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

use crate::errors::AppError;
use crate::services::token_service::{self, Claims};
use crate::state::AppState;

/// Caller whose token carries `isAdmin: true`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

fn claims_from_request(req: &HttpRequest) -> Result<Claims, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;

  let token = req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|token| !token.is_empty())
    .ok_or_else(|| {
      warn!("Request without a bearer token.");
      AppError::Auth("Access token required".to_string())
    })?;

  token_service::decode_token(token, &state.config.jwt_secret)
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = claims_from_request(req).and_then(|claims| {
      if claims.is_admin {
        Ok(AdminUser(claims))
      } else {
        warn!(user_id = %claims.id, "Non-admin attempted an admin operation.");
        Err(AppError::Forbidden("Admin access required".to_string()))
      }
    });
    ready(result)
  }
}
