// baattak/server/src/flows/mod.rs

//! Multi-step operations expressed as flows and registered once per
//! `AppState`.

use crate::errors::{AppError, Result as AppResult};
use crate::state::AppState;
use baattak_flow::{FlowContext, FlowOutcome, FlowRegistry};

pub mod contexts;
pub mod identity_flows;
pub mod order_flows;
pub mod sweep_flow;

pub fn register_all(registry: &FlowRegistry<AppError>) {
  tracing::debug!("Registering flows...");

  order_flows::register_submit_order_flow(registry);
  order_flows::register_archive_order_flow(registry);
  sweep_flow::register_sweep_flow(registry);
  identity_flows::register_request_otp_flow(registry);
  identity_flows::register_verify_otp_flow(registry);
  identity_flows::register_login_flow(registry);

  tracing::debug!(flows = registry.len(), "All flows registered.");
}

/// Runs the flow registered for `T` and hands back the final context.
pub async fn run_flow<T>(state: &AppState, data: T) -> AppResult<T>
where
  T: Clone + Send + Sync + 'static,
{
  let ctx = FlowContext::new(data);
  match state.flows.run(ctx.clone()).await? {
    FlowOutcome::Completed => Ok(ctx.snapshot()),
    FlowOutcome::Stopped => {
      tracing::warn!(context = std::any::type_name::<T>(), "Flow was halted by a step.");
      Err(AppError::Internal("Process was halted by an internal step.".to_string()))
    }
  }
}
