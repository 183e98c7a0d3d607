// baattak/server/src/services/token_service.rs

//! HS256 session tokens.

use crate::errors::AppError;
use crate::models::User;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
  pub id: Uuid,
  pub email: String,
  #[serde(rename = "isAdmin")]
  pub is_admin: bool,
  pub iat: i64,
  pub exp: i64,
}

#[instrument(name = "token_service::issue_token", skip(user, secret), fields(user_id = %user.id), err(Display))]
pub fn issue_token(user: &User, secret: &str, ttl: Duration) -> Result<String, AppError> {
  let iat = Utc::now().timestamp();
  let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|e| AppError::Config(format!("Invalid token TTL: {}", e)))?;
  let claims = Claims {
    id: user.id,
    email: user.email.clone(),
    is_admin: user.is_admin,
    iat,
    exp: iat + ttl_secs,
  };
  let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))?;
  debug!("Session token issued.");
  Ok(token)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
  let data = decode::<Claims>(
    token,
    &DecodingKey::from_secret(secret.as_bytes()),
    &Validation::new(Algorithm::HS256),
  )?;
  Ok(data.claims)
}
