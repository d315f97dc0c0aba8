//! Scheduler module keeping one probe timer per active target.

mod timer;

use crate::db::{Target, TargetId};
use crate::probe::Prober;
use crate::registry::Registry;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, Semaphore};

use timer::{run_probe_loop, TargetTimer};

/// Handle to a running timer task.
struct TimerHandle {
    interval_secs: u32,
    stop_tx: broadcast::Sender<()>,
}

impl TimerHandle {
    fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

/// Owns the live timers and aligns them with the registry on demand.
pub struct Scheduler {
    registry: Arc<Registry>,
    prober: Arc<dyn Prober>,
    overlap_guard: bool,
    timers: Mutex<HashMap<TargetId, TimerHandle>>,
    /// One in-flight permit per registered target, shared by every timer
    /// spawned for it. Only populated when the overlap guard is on.
    in_flight: Mutex<HashMap<TargetId, Arc<Semaphore>>>,
}

impl Scheduler {
    /// Create a scheduler. With `overlap_guard` set, a tick is skipped while
    /// the previous probe for the same target is still running.
    pub fn new(registry: Arc<Registry>, prober: Arc<dyn Prober>, overlap_guard: bool) -> Self {
        Self {
            registry,
            prober,
            overlap_guard,
            timers: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Align live timers with the given targets.
    ///
    /// Timers whose target is still active with the same interval keep
    /// running with their phase intact. Everything else is stopped, and
    /// newly wanted timers start with an immediate probe.
    pub async fn reconcile(&self, targets: &[Target]) {
        let desired: HashMap<&str, u32> = targets
            .iter()
            .filter(|t| t.is_active)
            .map(|t| (t.id.as_str(), t.interval_secs))
            .collect();

        let mut timers = self.timers.lock().await;
        let mut in_flight = self.in_flight.lock().await;

        // Permits outlive pauses and retiming; they go with the target.
        in_flight.retain(|id, _| targets.iter().any(|t| &t.id == id));

        timers.retain(|id, handle| match desired.get(id.as_str()) {
            Some(&interval_secs) if interval_secs == handle.interval_secs => true,
            _ => {
                handle.stop();
                tracing::info!("Scheduler: Stopped timer for {}", id);
                false
            }
        });

        for target in targets.iter().filter(|t| t.is_active) {
            if timers.contains_key(&target.id) {
                continue;
            }
            let guard = self.overlap_guard.then(|| {
                in_flight
                    .entry(target.id.clone())
                    .or_insert_with(|| Arc::new(Semaphore::new(1)))
                    .clone()
            });
            let handle = self.spawn_timer(target, guard);
            timers.insert(target.id.clone(), handle);
            tracing::info!(
                "Scheduler: Started timer for {} every {}s",
                target.name,
                target.interval_secs
            );
        }
    }

    /// Stop every timer. In-flight probes are left to finish.
    pub async fn shutdown(&self) {
        let mut timers = self.timers.lock().await;
        for (_, handle) in timers.drain() {
            handle.stop();
        }
        self.in_flight.lock().await.clear();
        tracing::info!("Scheduler: All timers stopped");
    }

    /// Ids of targets with a live timer, sorted.
    pub async fn active_timers(&self) -> Vec<TargetId> {
        let timers = self.timers.lock().await;
        let mut ids: Vec<TargetId> = timers.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn spawn_timer(&self, target: &Target, in_flight: Option<Arc<Semaphore>>) -> TimerHandle {
        let (stop_tx, stop_rx) = broadcast::channel(1);

        let timer = TargetTimer {
            target_id: target.id.clone(),
            name: target.name.clone(),
            url: target.url.clone(),
            interval: Duration::from_secs(u64::from(target.interval_secs)),
            registry: self.registry.clone(),
            prober: self.prober.clone(),
            in_flight,
        };
        tokio::spawn(run_probe_loop(timer, stop_rx));

        TimerHandle {
            interval_secs: target.interval_secs,
            stop_tx,
        }
    }
}
