// baattak/server/src/flows/sweep_flow.rs

//! Moves carts older than a cutoff into order history.
//!
//! Each stale cart is archived by id through the repository's atomic archive,
//! so exactly the carts that reached history are removed. A cart that
//! disappears between selection and archiving (accepted and archived by
//! staff, or deleted) is skipped.

use crate::errors::{AppError, Result as AppResult};
use crate::flows::contexts::{SweepCtx, SweepReport};
use crate::flows::run_flow;
use crate::state::AppState;
use baattak_flow::{Flow, FlowContext, FlowControl, FlowRegistry, SkipCondition};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub fn register_sweep_flow(registry: &FlowRegistry<AppError>) {
  let nothing_stale: SkipCondition<SweepCtx> = Arc::new(|ctx: &SweepCtx| ctx.stale_ids.is_empty());
  let mut flow = Flow::<SweepCtx, AppError>::new(&[
    ("select_stale_carts", false, None),
    ("archive_stale_carts", false, Some(nothing_stale)),
  ])
  .named("sweep_expired_carts");

  flow.on("select_stale_carts", |ctx: FlowContext<SweepCtx>| async move {
    let (carts, cutoff) = {
      let guard = ctx.read();
      (guard.app_state.carts.clone(), guard.cutoff)
    };

    let stale_ids = carts.list_created_before(cutoff).await?;
    debug!(%cutoff, stale = stale_ids.len(), "Selected stale carts.");
    {
      let mut guard = ctx.write();
      guard.report.examined = stale_ids.len();
      guard.stale_ids = stale_ids;
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  flow.on("archive_stale_carts", |ctx: FlowContext<SweepCtx>| async move {
    let (carts, stale_ids) = {
      let guard = ctx.read();
      (guard.app_state.carts.clone(), guard.stale_ids.clone())
    };

    let mut archived = 0;
    for cart_id in stale_ids {
      match carts.archive(cart_id).await? {
        Some(order) => {
          debug!(%cart_id, order_id = %order.id, "Expired cart archived.");
          archived += 1;
        }
        None => debug!(%cart_id, "Cart vanished before it could be archived; skipping."),
      }
    }
    ctx.write().report.archived = archived;
    Ok::<_, AppError>(FlowControl::Continue)
  });

  registry.register(flow);
}

/// Archives every cart created before `now - max_age`.
#[instrument(name = "sweep::expire_carts", skip(state), err(Display))]
pub async fn expire_carts(state: &AppState, max_age: Duration, now: DateTime<Utc>) -> AppResult<SweepReport> {
  let max_age = chrono::Duration::from_std(max_age).map_err(|e| AppError::Config(format!("Invalid cart max age: {}", e)))?;
  let cutoff = now
    .checked_sub_signed(max_age)
    .ok_or_else(|| AppError::Config(format!("Cart max age {} reaches past the earliest representable time", max_age)))?;
  let ctx = SweepCtx {
    app_state: state.clone(),
    cutoff,
    stale_ids: Vec::new(),
    report: SweepReport::default(),
  };

  let report = run_flow(state, ctx).await?.report;
  if report.archived > 0 {
    info!(examined = report.examined, archived = report.archived, "Expired carts moved to order history.");
  }
  Ok(report)
}
