// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use baattak_server::config::AppConfig;
use baattak_server::errors::Result as AppResult;
use baattak_server::models::{NewUser, User};
use baattak_server::repositories::{MemoryStore, UserRepository};
use baattak_server::services::mailer::Mailer;
use baattak_server::services::{auth_service, token_service};
use baattak_server::state::AppState;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Captures OTP deliveries instead of logging them.
#[derive(Default)]
pub struct RecordingMailer {
  pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
  pub fn last_code_for(&self, email: &str) -> Option<String> {
    self
      .sent
      .lock()
      .iter()
      .rev()
      .find(|(to, _)| to == email)
      .map(|(_, code)| code.clone())
  }
}

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send_otp(&self, to: &str, code: &str) -> AppResult<()> {
    self.sent.lock().push((to.to_string(), code.to_string()));
    Ok(())
  }
}

pub fn test_config() -> AppConfig {
  let upload_dir = std::env::temp_dir().join(format!("baattak-uploads-{}", Uuid::new_v4()));
  let vars: HashMap<&str, String> = HashMap::from([
    ("STORE_BACKEND", "memory".to_string()),
    ("JWT_SECRET", JWT_SECRET.to_string()),
    ("UPLOAD_DIR", upload_dir.display().to_string()),
  ]);
  AppConfig::from_lookup(|name| vars.get(name).cloned()).expect("test config")
}

pub struct TestContext {
  pub store: Arc<MemoryStore>,
  pub mailer: Arc<RecordingMailer>,
  pub state: AppState,
}

impl TestContext {
  pub fn new() -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(store.clone(), mailer.clone(), Arc::new(test_config()));
    Self { store, mailer, state }
  }

  /// Inserts a verified user and returns it with a valid bearer token.
  pub async fn user_with_token(&self, email: &str, password: &str, is_admin: bool) -> (User, String) {
    let user = UserRepository::insert(
      self.store.as_ref(),
      NewUser {
        username: email.split('@').next().unwrap_or("user").to_string(),
        phone_number: format!("{:010}", rand_phone_suffix(email)),
        email: email.to_string(),
        password_hash: auth_service::hash_password(password).unwrap(),
        otp: None,
        otp_expires: None,
        is_admin,
      },
    )
    .await
    .unwrap();
    let token = token_service::issue_token(&user, JWT_SECRET, std::time::Duration::from_secs(3600)).unwrap();
    (user, token)
  }

  pub async fn admin_token(&self) -> String {
    self.user_with_token("admin@baattak.test", "admin-pass", true).await.1
  }
}

fn rand_phone_suffix(seed: &str) -> u64 {
  seed.bytes().fold(7u64, |acc, b| (acc * 31 + u64::from(b)) % 10_000_000_000)
}

pub fn bearer(token: &str) -> (&'static str, String) {
  ("Authorization", format!("Bearer {}", token))
}

/// Builds the full application around `state` for `actix_web::test` calls.
macro_rules! init_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .app_data(baattak_server::web::json_config())
        .configure(baattak_server::web::configure_app_routes),
    )
    .await
  };
}
pub(crate) use init_app;
