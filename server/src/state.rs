// baattak/server/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::flows;
use crate::repositories::{CartRepository, DishRepository, HistoryRepository, UserRepository};
use crate::services::mailer::Mailer;
use baattak_flow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub dishes: Arc<dyn DishRepository>,
  pub carts: Arc<dyn CartRepository>,
  pub history: Arc<dyn HistoryRepository>,
  pub users: Arc<dyn UserRepository>,
  pub mailer: Arc<dyn Mailer>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires every repository seam to `store` and registers the flows.
  pub fn new<S>(store: Arc<S>, mailer: Arc<dyn Mailer>, config: Arc<AppConfig>) -> Self
  where
    S: DishRepository + CartRepository + HistoryRepository + UserRepository + 'static,
  {
    let registry = Arc::new(FlowRegistry::new());
    flows::register_all(&registry);

    Self {
      dishes: store.clone(),
      carts: store.clone(),
      history: store.clone(),
      users: store,
      mailer,
      flows: registry,
      config,
    }
  }
}
