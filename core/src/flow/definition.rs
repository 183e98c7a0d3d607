// baattak-flow/src/flow/definition.rs

//! The [`Flow`] type and its construction.

use crate::error::FlowError;
use crate::step::{Handler, SkipCondition, StepDef};
use std::collections::HashMap;

/// An ordered set of named steps operating on a context of type `T`.
///
/// `E` is the error type handlers return. It must absorb [`FlowError`] so
/// engine failures surface through the same channel as handler failures.
pub struct Flow<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) before: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) on: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T, E>>>,
}

impl<T, E> Flow<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Builds a flow from `(name, optional, skip_if)` triples.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<T>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name: short_type_name::<T>().to_string(),
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Overrides the name used in log spans (defaults to the context type name).
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step: a misspelled step name is a wiring bug.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("flow '{}' has no step named '{}'", self.name, step_name);
    }
  }
}

fn short_type_name<T>() -> &'static str {
  let full = std::any::type_name::<T>();
  full.rsplit("::").next().unwrap_or(full)
}
