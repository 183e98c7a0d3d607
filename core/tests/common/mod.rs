// tests/common/mod.rs
#![allow(dead_code)]

use baattak_flow::{FlowContext, FlowControl, FlowError, Handler};
use once_cell::sync::Lazy;
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct TicketContext {
  pub steps_executed: Vec<String>,
  pub total: i32,
  pub stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("engine: {0}")]
  Engine(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Engine(err.to_string())
  }
}

/// Records the step, adds `amount` and honours `stop_at`.
pub fn recording_handler(step_name: &'static str, amount: i32) -> Handler<TicketContext, TestError> {
  Box::new(move |ctx: FlowContext<TicketContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.steps_executed.push(step_name.to_string());
      guard.total += amount;
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(FlowControl::Stop);
      }
      Ok(FlowControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> Handler<TicketContext, TestError> {
  Box::new(move |ctx: FlowContext<TicketContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

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
