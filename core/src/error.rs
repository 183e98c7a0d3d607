// baattak-flow/src/error.rs

use thiserror::Error;

/// Failures raised by the engine itself rather than by step handlers.
#[derive(Debug, Error)]
pub enum FlowError {
  /// A non-optional step reached execution with no `on` handler attached.
  #[error("Step '{step_name}' is required but has no handlers")]
  HandlerMissing { step_name: String },

  /// [`FlowRegistry::run`](crate::FlowRegistry::run) found nothing for the context's type.
  #[error("No flow registered for context type {context_type}")]
  NotRegistered { context_type: String },

  #[error("Context type mismatch: expected {expected_type}")]
  TypeMismatch { expected_type: String },
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
