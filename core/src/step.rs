// baattak-flow/src/step.rs

use crate::context::FlowContext;
use crate::control::FlowControl;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed async step handler.
///
/// A handler receives its own clone of the run's [`FlowContext`] and resolves
/// to the [`FlowControl`] that decides whether the run continues. Handlers
/// take locks on the context, copy out what they need, and release the guard
/// before awaiting anything.
pub type Handler<T, E> =
  Box<dyn Fn(FlowContext<T>) -> Pin<Box<dyn Future<Output = Result<FlowControl, E>> + Send>> + Send + Sync>;

/// Predicate evaluated before a step; `true` skips it.
pub type SkipCondition<T> = Arc<dyn Fn(&T) -> bool + Send + Sync + 'static>;

/// One named step in a flow's declaration order.
#[derive(Clone)]
pub struct StepDef<T: Send + Sync + 'static> {
  pub name: String,
  /// An optional step with no `on` handlers is passed over instead of
  /// failing the run with [`FlowError::HandlerMissing`](crate::FlowError::HandlerMissing).
  pub optional: bool,
  /// Checked against the context right before the step runs.
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: Send + Sync + 'static> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("has_skip_if", &self.skip_if.is_some())
      .finish()
  }
}
