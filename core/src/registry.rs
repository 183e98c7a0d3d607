// baattak-flow/src/registry.rs

//! Type-keyed registry of flows.

use crate::context::FlowContext;
use crate::control::FlowOutcome;
use crate::error::FlowError;
use crate::flow::Flow;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[async_trait]
trait ErasedFlow<E>: Send + Sync
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn name(&self) -> &str;

  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowOutcome, E>;
}

#[async_trait]
impl<T, E> ErasedFlow<E> for Flow<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn name(&self) -> &str {
    Flow::name(self)
  }

  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowOutcome, E> {
    let ctx = ctx.downcast::<FlowContext<T>>().map_err(|_| {
      E::from(FlowError::TypeMismatch {
        expected_type: std::any::type_name::<FlowContext<T>>().to_string(),
      })
    })?;
    self.run(*ctx).await
  }
}

/// Holds at most one flow per context type.
pub struct FlowRegistry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: RwLock<HashMap<TypeId, Arc<dyn ErasedFlow<E>>>>,
}

impl<E> FlowRegistry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `flow`, replacing any flow previously registered for `T`.
  pub fn register<T>(&self, flow: Flow<T, E>)
  where
    T: Send + Sync + 'static,
  {
    debug!(flow = %flow.name(), "Registering flow.");
    self.flows.write().insert(TypeId::of::<T>(), Arc::new(flow));
  }

  pub fn is_registered<T: 'static>(&self) -> bool {
    self.flows.read().contains_key(&TypeId::of::<T>())
  }

  pub fn len(&self) -> usize {
    self.flows.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.flows.read().is_empty()
  }

  /// Runs the flow registered for the context's data type.
  #[instrument(name = "FlowRegistry::run", skip_all, fields(context_type = %std::any::type_name::<T>()))]
  pub async fn run<T>(&self, ctx: FlowContext<T>) -> Result<FlowOutcome, E>
  where
    T: Send + Sync + 'static,
  {
    let flow = self.flows.read().get(&TypeId::of::<T>()).cloned();
    let flow = flow.ok_or_else(|| {
      let context_type = std::any::type_name::<T>().to_string();
      error!(%context_type, "No flow registered.");
      E::from(FlowError::NotRegistered { context_type })
    })?;

    debug!(flow = %flow.name(), "Dispatching flow.");
    flow.run_erased(Box::new(ctx)).await
  }
}

impl<E> Default for FlowRegistry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
