// baattak/server/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub username: String,
  pub phone_number: String,
  pub email: String,
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  #[serde(skip_serializing, default)]
  pub otp: Option<String>,
  pub otp_expires: Option<DateTime<Utc>>,
  pub is_admin: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  /// Registration is incomplete while any OTP field is still set.
  pub fn is_verified(&self) -> bool {
    self.otp.is_none() && self.otp_expires.is_none()
  }
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub username: String,
  pub phone_number: String,
  pub email: String,
  pub password_hash: String,
  pub otp: Option<String>,
  pub otp_expires: Option<DateTime<Utc>>,
  pub is_admin: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  pub username: Option<String>,
  pub email: Option<String>,
  pub phone_number: Option<String>,
}

impl ProfileUpdate {
  /// Strips surrounding whitespace from every supplied field.
  pub fn trimmed(self) -> Self {
    let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
    Self {
      username: trim(self.username),
      email: trim(self.email),
      phone_number: trim(self.phone_number),
    }
  }

  pub fn apply_to(&self, user: &mut User) {
    if let Some(username) = &self.username {
      user.username = username.clone();
    }
    if let Some(email) = &self.email {
      user.email = email.clone();
    }
    if let Some(phone_number) = &self.phone_number {
      user.phone_number = phone_number.clone();
    }
  }
}

/// The user fields returned alongside a session token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
  pub id: Uuid,
  pub email: String,
  pub username: String,
  pub phone_number: String,
  pub is_admin: bool,
}

impl From<&User> for PublicUser {
  fn from(user: &User) -> Self {
    Self {
      id: user.id,
      email: user.email.clone(),
      username: user.username.clone(),
      phone_number: user.phone_number.clone(),
      is_admin: user.is_admin,
    }
  }
}
