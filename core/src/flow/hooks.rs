// baattak-flow/src/flow/hooks.rs

//! Handler registration for the three phases of a step.

use super::definition::Flow;
use crate::context::FlowContext;
use crate::control::FlowControl;
use crate::error::FlowError;
use crate::step::Handler;
use std::collections::HashMap;
use std::future::Future;

impl<T, E> Flow<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn before<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowContext<T>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<FlowControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<E> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push_handler(&mut self.before, step_name, box_handler(handler_fn));
  }

  pub fn on<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowContext<T>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<FlowControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<E> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push_handler(&mut self.on, step_name, box_handler(handler_fn));
  }

  pub fn after<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowContext<T>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<FlowControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<E> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push_handler(&mut self.after, step_name, box_handler(handler_fn));
  }
}

fn box_handler<T, E, F, HandlerErr>(
  handler_fn: impl Fn(FlowContext<T>) -> F + Send + Sync + 'static,
) -> Handler<T, E>
where
  T: Send + Sync + 'static,
  E: Send + 'static,
  F: Future<Output = Result<FlowControl, HandlerErr>> + Send + 'static,
  HandlerErr: Into<E> + Send + Sync + 'static,
{
  Box::new(move |ctx| {
    let fut = handler_fn(ctx);
    Box::pin(async move { fut.await.map_err(Into::into) })
  })
}

fn push_handler<T: Send + Sync + 'static, E>(
  phase: &mut HashMap<String, Vec<Handler<T, E>>>,
  step_name: &str,
  handler: Handler<T, E>,
) {
  phase.entry(step_name.to_string()).or_default().push(handler);
}
