// baattak/server/src/services/sweeper.rs

use crate::config::SweepConfig;
use crate::flows::sweep_flow;
use crate::state::AppState;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

/// Spawns the periodic expiry sweep. The task ends when `shutdown` is
/// cancelled; a failed sweep is logged and retried on the next tick.
pub fn spawn_sweeper(state: AppState, config: SweepConfig, shutdown: CancellationToken) -> JoinHandle<()> {
  let span = info_span!(
    "cart_sweeper",
    interval_secs = config.interval.as_secs(),
    max_age_secs = config.max_cart_age.as_secs()
  );

  tokio::spawn(
    async move {
      let mut ticker = interval(config.interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
      info!("Cart sweeper started.");

      loop {
        tokio::select! {
          _ = shutdown.cancelled() => break,
          _ = ticker.tick() => {
            if let Err(e) = sweep_flow::expire_carts(&state, config.max_cart_age, Utc::now()).await {
              error!(error = %e, "Cart sweep failed.");
            }
          }
        }
      }

      info!("Cart sweeper stopped.");
    }
    .instrument(span),
  )
}
