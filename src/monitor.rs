//! Command and read surface over the registry and scheduler.
//!
//! Every command mutates the registry first and then reconciles the
//! scheduler against the committed snapshot. Commands are serialized so a
//! reconciliation never works from a stale snapshot.

use crate::db::{Target, TargetId};
use crate::metrics;
use crate::probe::Prober;
use crate::registry::{Registry, RegistryError};
use crate::scheduler::Scheduler;

use std::sync::Arc;
use tokio::sync::Mutex;

pub struct Monitor {
    registry: Arc<Registry>,
    scheduler: Scheduler,
    commands: Mutex<()>,
}

impl Monitor {
    pub fn new(registry: Arc<Registry>, prober: Arc<dyn Prober>, overlap_guard: bool) -> Self {
        let scheduler = Scheduler::new(registry.clone(), prober, overlap_guard);
        Self {
            registry,
            scheduler,
            commands: Mutex::new(()),
        }
    }

    /// Start timers for every active target already in the registry.
    pub async fn start(&self) {
        let _guard = self.commands.lock().await;
        self.reconcile().await;
    }

    // --- Reads ---

    pub async fn list_targets(&self) -> Vec<Target> {
        self.registry.list().await
    }

    pub async fn get_target(&self, id: &str) -> Option<Target> {
        self.registry.get(id).await
    }

    pub async fn fleet_uptime_percent(&self) -> u32 {
        metrics::fleet_uptime_percent(&self.registry.list().await)
    }

    pub async fn active_timers(&self) -> Vec<TargetId> {
        self.scheduler.active_timers().await
    }

    // --- Commands ---

    pub async fn create_target(
        &self,
        name: &str,
        url: &str,
        interval_secs: u32,
    ) -> Result<Target, RegistryError> {
        let _guard = self.commands.lock().await;
        let target = self.registry.create(name, url, interval_secs).await?;
        self.reconcile().await;
        Ok(target)
    }

    pub async fn delete_target(&self, id: &str) -> Result<(), RegistryError> {
        let _guard = self.commands.lock().await;
        self.registry.delete(id).await?;
        self.reconcile().await;
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<Target, RegistryError> {
        let _guard = self.commands.lock().await;
        let target = self.registry.set_active(id, active).await?;
        self.reconcile().await;
        Ok(target)
    }

    pub async fn toggle_target(&self, id: &str) -> Result<Target, RegistryError> {
        let _guard = self.commands.lock().await;
        let target = self.registry.toggle(id).await?;
        self.reconcile().await;
        Ok(target)
    }

    pub async fn set_interval(&self, id: &str, interval_secs: u32) -> Result<Target, RegistryError> {
        let _guard = self.commands.lock().await;
        let target = self.registry.set_interval(id, interval_secs).await?;
        self.reconcile().await;
        Ok(target)
    }

    /// Stop all timers. The registry stays readable.
    pub async fn shutdown(&self) {
        let _guard = self.commands.lock().await;
        self.scheduler.shutdown().await;
    }

    async fn reconcile(&self) {
        let snapshot = self.registry.list().await;
        self.scheduler.reconcile(&snapshot).await;
    }
}
