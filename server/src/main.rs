// baattak/server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use baattak_server::config::{AppConfig, StoreBackend};
use baattak_server::repositories::{MemoryStore, PgStore};
use baattak_server::services::mailer;
use baattak_server::services::sweeper;
use baattak_server::state::AppState;
use baattak_server::web;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting Baattak ordering server...");

  let app_config = Arc::new(AppConfig::from_env().context("failed to load configuration")?);
  tracing::debug!(config = ?app_config, "Loaded configuration.");

  let mailer = mailer::build_mailer(&app_config).context("failed to set up the mailer")?;
  let app_state = match app_config.store_backend {
    StoreBackend::Postgres => {
      let database_url = app_config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres backend")?;
      let store = PgStore::connect(database_url).await.context("failed to connect to the database")?;
      if app_config.run_migrations {
        store.migrate().await.context("failed to run database migrations")?;
      }
      AppState::new(Arc::new(store), mailer, app_config.clone())
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      AppState::new(Arc::new(MemoryStore::new()), mailer, app_config.clone())
    }
  };

  let shutdown = CancellationToken::new();
  let sweeper_task = app_config
    .sweep
    .enabled
    .then(|| sweeper::spawn_sweeper(app_state.clone(), app_config.sweep, shutdown.clone()));

  let server_address = app_config.bind_address();
  tracing::info!("Binding server to {}...", server_address);

  let cors_config = app_config.clone();
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .app_data(web::json_config())
      .wrap(web::cors(&cors_config))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("failed to bind {}", server_address))?
  .run()
  .await?;

  shutdown.cancel();
  if let Some(task) = sweeper_task {
    if let Err(e) = task.await {
      tracing::error!(error = %e, "Cart sweeper task did not shut down cleanly.");
    }
  }
  tracing::info!("Server stopped.");
  Ok(())
}
