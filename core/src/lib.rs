// src/lib.rs

//! Step pipelines for the Baattak ordering backend.
//!
//! A [`Flow`] is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers that receive a shared [`FlowContext`]
//! and decide whether the run continues. Flows are registered in a
//! [`FlowRegistry`] keyed by their context type, so a request handler only
//! needs to build the context and ask the registry to run it.
//!
//! ```ignore
//! let mut flow = Flow::<SubmitOrder, AppError>::new(&[
//!   ("validate", false, None),
//!   ("persist", false, None),
//! ]);
//! flow.on("validate", |ctx: FlowContext<SubmitOrder>| async move { /* ... */ });
//! registry.register(flow);
//! registry.run(FlowContext::new(submit)).await?;
//! ```

pub mod context;
pub mod control;
pub mod error;
pub mod flow;
pub mod registry;
pub mod step;

pub use crate::context::FlowContext;
pub use crate::control::{FlowControl, FlowOutcome};
pub use crate::error::{FlowError, FlowResult};
pub use crate::flow::Flow;
pub use crate::registry::FlowRegistry;
pub use crate::step::{Handler, SkipCondition, StepDef};
