// baattak-flow/src/flow/execution.rs

//! Running a [`Flow`] against a context.

use super::definition::Flow;
use crate::context::FlowContext;
use crate::control::{FlowControl, FlowOutcome};
use crate::error::FlowError;
use crate::step::Handler;
use tracing::{debug, error, info, info_span, instrument, Instrument};

#[derive(Clone, Copy)]
enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

impl<T, E> Flow<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes every step in order.
  ///
  /// The first handler error aborts the run and is returned as-is. A handler
  /// returning [`FlowControl::Stop`] ends the run with [`FlowOutcome::Stopped`].
  #[instrument(name = "Flow::run", skip_all, fields(flow = %self.name, steps = self.steps.len()), err(Display))]
  pub async fn run(&self, ctx: FlowContext<T>) -> Result<FlowOutcome, E> {
    for (index, step) in self.steps.iter().enumerate() {
      let step_name = step.name.as_str();

      let skip = match &step.skip_if {
        Some(predicate) => predicate(&ctx.read()),
        None => false,
      };
      if skip {
        debug!(step = step_name, "Step skipped by predicate.");
        continue;
      }

      let before = self.before.get(step_name).filter(|h| !h.is_empty());
      let on = self.on.get(step_name).filter(|h| !h.is_empty());
      let after = self.after.get(step_name).filter(|h| !h.is_empty());

      if before.is_none() && on.is_none() && after.is_none() {
        if step.optional {
          debug!(step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        error!(step = step_name, "Required step has no handlers.");
        return Err(E::from(FlowError::HandlerMissing {
          step_name: step.name.clone(),
        }));
      }

      let span = info_span!("flow_step", step = step_name, index);
      let stopped = async {
        for (phase, handlers) in [(Phase::Before, before), (Phase::On, on), (Phase::After, after)] {
          if let Some(handlers) = handlers {
            if run_phase(phase, handlers, &ctx).await? == FlowControl::Stop {
              return Ok::<bool, E>(true);
            }
          }
        }
        Ok(false)
      }
      .instrument(span)
      .await?;

      if stopped {
        info!(step = step_name, "Flow stopped by handler.");
        return Ok(FlowOutcome::Stopped);
      }
    }

    debug!("Flow completed.");
    Ok(FlowOutcome::Completed)
  }
}

async fn run_phase<T, E>(phase: Phase, handlers: &[Handler<T, E>], ctx: &FlowContext<T>) -> Result<FlowControl, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  for handler in handlers {
    match handler(ctx.clone()).await {
      Ok(FlowControl::Continue) => {}
      Ok(FlowControl::Stop) => return Ok(FlowControl::Stop),
      Err(e) => {
        error!(phase = phase.as_str(), error = %e, "Step handler failed.");
        return Err(e);
      }
    }
  }
  Ok(FlowControl::Continue)
}
