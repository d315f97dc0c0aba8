//! Per-target repeating probe loop.

use crate::db::TargetId;
use crate::probe::Prober;
use crate::registry::{Registry, RegistryError};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};
use tokio::time::MissedTickBehavior;

/// Everything a timer task needs to probe one target and record the result.
pub(super) struct TargetTimer {
    pub target_id: TargetId,
    pub name: String,
    pub url: String,
    pub interval: Duration,
    pub registry: Arc<Registry>,
    pub prober: Arc<dyn Prober>,
    /// Single permit when overlap protection is enabled.
    pub in_flight: Option<Arc<Semaphore>>,
}

impl TargetTimer {
    /// Spawn one probe-and-record cycle.
    fn fire(&self) {
        let permit = match &self.in_flight {
            Some(semaphore) => match semaphore.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::debug!("Skipping probe for {}: previous probe still running", self.name);
                    return;
                }
            },
            None => None,
        };

        let registry = self.registry.clone();
        let prober = self.prober.clone();
        let target_id = self.target_id.clone();
        let name = self.name.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            let _permit = permit;

            let outcome = prober.probe(&url).await;
            tracing::debug!(
                "Probe {}: {:?} code={:?} latency={}ms",
                name,
                outcome.status,
                outcome.status_code,
                outcome.latency_ms
            );

            match registry.record_outcome(&target_id, outcome).await {
                Ok(()) => {}
                Err(RegistryError::NotFound(_)) => {
                    tracing::warn!("Discarding outcome for removed target {}", name);
                }
                Err(e) => {
                    tracing::error!("Failed to record outcome for {}: {}", name, e);
                }
            }
        });
    }
}

/// Probe immediately, then once per interval, until stopped.
pub(super) async fn run_probe_loop(timer: TargetTimer, mut stop_rx: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(timer.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                timer.fire();
            }
        }
    }

    tracing::debug!("Timer loop for {} exited", timer.name);
}
