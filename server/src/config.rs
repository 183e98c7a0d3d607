// baattak/server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5174,https://baattak.vercel.app";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
      "memory" | "mem" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
  pub enabled: bool,
  pub interval: Duration,
  /// Carts created longer ago than this are moved to history.
  pub max_cart_age: Duration,
}

/// Outbound SMTP relay. Present only when `SMTP_HOST` is set; otherwise OTP
/// mail goes to the log.
#[derive(Clone)]
pub struct SmtpConfig {
  pub host: String,
  pub port: u16,
  /// Implicit TLS from the first byte (port 465). When false the connection
  /// is upgraded with STARTTLS.
  pub secure: bool,
  pub username: Option<String>,
  pub password: Option<String>,
}

impl std::fmt::Debug for SmtpConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SmtpConfig")
      .field("host", &self.host)
      .field("port", &self.port)
      .field("secure", &self.secure)
      .field("username", &self.username)
      .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
      .finish()
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub run_migrations: bool,
  pub jwt_secret: String,
  pub token_ttl: Duration,
  pub otp_ttl: Duration,
  pub mail_sender: String,
  pub smtp: Option<SmtpConfig>,
  pub cors_allowed_origins: Vec<String>,
  pub upload_dir: PathBuf,
  pub sweep: SweepConfig,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("store_backend", &self.store_backend)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("run_migrations", &self.run_migrations)
      .field("jwt_secret", &"[REDACTED]")
      .field("token_ttl", &self.token_ttl)
      .field("otp_ttl", &self.otp_ttl)
      .field("mail_sender", &self.mail_sender)
      .field("smtp", &self.smtp)
      .field("cors_allowed_origins", &self.cors_allowed_origins)
      .field("upload_dir", &self.upload_dir)
      .field("sweep", &self.sweep)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. `from_env` passes the
  /// process environment; tests pass a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let env_or = |var_name: &str, default: &str| get_env(var_name).unwrap_or_else(|_| default.to_string());

    let server_host = env_or("SERVER_HOST", "127.0.0.1");
    let server_port = env_or("SERVER_PORT", "3002")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend = env_or("STORE_BACKEND", "postgres").parse::<StoreBackend>()?;
    let database_url = match store_backend {
      StoreBackend::Postgres => Some(get_env("DATABASE_URL")?),
      StoreBackend::Memory => get_env("DATABASE_URL").ok(),
    };
    let run_migrations = parse_bool("RUN_MIGRATIONS", &env_or("RUN_MIGRATIONS", "true"))?;

    let jwt_secret = get_env("JWT_SECRET")?;
    let token_ttl = parse_secs("TOKEN_TTL_SECS", &env_or("TOKEN_TTL_SECS", "7200"))?;
    let otp_ttl = parse_secs("OTP_TTL_SECS", &env_or("OTP_TTL_SECS", "600"))?;
    let smtp = match get_env("SMTP_HOST").ok() {
      Some(host) => {
        // Only the exact string "true" selects implicit TLS.
        let secure = get_env("SMTP_SECURE").is_ok_and(|v| v.trim() == "true");
        let default_port = if secure { "465" } else { "587" };
        let port = env_or("SMTP_PORT", default_port)
          .trim()
          .parse::<u16>()
          .map_err(|e| AppError::Config(format!("Invalid SMTP_PORT: {}", e)))?;
        Some(SmtpConfig {
          host: host.trim().to_string(),
          port,
          secure,
          username: get_env("SMTP_USER").ok(),
          password: get_env("SMTP_PASS").ok(),
        })
      }
      None => None,
    };
    let mail_sender = get_env("SMTP_FROM")
      .or_else(|_| get_env("MAIL_SENDER"))
      .or_else(|_| get_env("SMTP_USER"))
      .unwrap_or_else(|_| "noreply@baattak.local".to_string());

    let cors_allowed_origins = env_or("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS)
      .split(',')
      .map(str::trim)
      .filter(|origin| !origin.is_empty())
      .map(str::to_string)
      .collect();
    let upload_dir = PathBuf::from(env_or("UPLOAD_DIR", "uploads"));

    let sweep = SweepConfig {
      enabled: parse_bool("SWEEP_ENABLED", &env_or("SWEEP_ENABLED", "false"))?,
      interval: parse_secs("SWEEP_INTERVAL_SECS", &env_or("SWEEP_INTERVAL_SECS", "60"))?,
      max_cart_age: parse_secs("CART_MAX_AGE_SECS", &env_or("CART_MAX_AGE_SECS", "300"))?,
    };
    if sweep.enabled && sweep.interval.is_zero() {
      return Err(AppError::Config("SWEEP_INTERVAL_SECS must be greater than zero".to_string()));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      run_migrations,
      jwt_secret,
      token_ttl,
      otp_ttl,
      mail_sender,
      smtp,
      cors_allowed_origins,
      upload_dir,
      sweep,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_bool(var_name: &str, raw: &str) -> Result<bool> {
  raw
    .trim()
    .parse::<bool>()
    .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e)))
}

fn parse_secs(var_name: &str, raw: &str) -> Result<Duration> {
  raw
    .trim()
    .parse::<u64>()
    .map(Duration::from_secs)
    .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e)))
}
