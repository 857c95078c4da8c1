//! Timer loop that drives the menu scheduler once per scan interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use menumailer_core::scheduler::MenuScheduler;

/// Calls [`MenuScheduler::tick`] on a fixed interval until shutdown.
///
/// A tick runs to completion before the next one starts, so a slow SMTP
/// exchange delays the following tick instead of stacking ticks up.
pub struct TickLoop {
    scheduler: Arc<MenuScheduler>,
    scan_interval: Duration,
}

impl TickLoop {
    pub fn new(scheduler: Arc<MenuScheduler>, scan_interval: Duration) -> Self {
        Self {
            scheduler,
            scan_interval,
        }
    }

    /// Run until `shutdown` is notified. The first tick fires immediately.
    pub async fn run(&self, shutdown: Arc<Notify>) {
        info!(
            scan_interval_secs = self.scan_interval.as_secs(),
            "scheduler loop started"
        );

        let mut interval = time::interval(self.scan_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let state = self.scheduler.tick().await;
                    debug!(state = %state, "tick complete");
                }
                _ = shutdown.notified() => {
                    info!("scheduler loop stopping");
                    break;
                }
            }
        }
    }
}
