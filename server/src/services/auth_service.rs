// baattak/server/src/services/auth_service.rs

//! Password hashing, OTP generation and the input checks shared by the
//! identity flows.

use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use rand::Rng;
use tracing::{debug, error, instrument};

pub const OTP_LENGTH: usize = 6;

#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    error!("Password hashing failed: Password cannot be empty.");
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => {
      debug!("Password hashed successfully.");
      Ok(hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
#[instrument(
  name = "auth_service::verify_password",
  skip(stored_hash, provided_password),
  err(Display),
  fields(hash_len = stored_hash.len())
)]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!("Password verification process failed: {}", other_argon_err)))
    }
  }
}

/// Six decimal digits, 100000 through 999999.
pub fn generate_otp() -> String {
  rand::rng().random_range(100_000..=999_999u32).to_string()
}

/// Accepts `local@domain.tld` shaped addresses.
pub fn is_valid_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  let local_ok = !local.is_empty()
    && local
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'));
  let Some((host, tld)) = domain.rsplit_once('.') else {
    return false;
  };
  let host_ok = !host.is_empty() && host.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'));
  let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
  local_ok && host_ok && tld_ok
}

/// Exactly ten ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
  phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}
