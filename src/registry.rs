//! In-memory target registry backed by the durable store.
//!
//! Every mutation happens under the write lock and persists the full
//! snapshot before the lock is released, so readers only ever see a
//! committed state.

use crate::db::{
    validate_interval, validate_name, validate_url, Outcome, Store, Target, TargetId,
    ValidationError, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
};

use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

const ID_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Registry error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("target not found: {0}")]
    NotFound(TargetId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

struct State {
    targets: Vec<Target>,
    /// Every id handed out or loaded during this process.
    issued: HashSet<TargetId>,
}

/// The process-wide collection of targets.
pub struct Registry {
    store: Arc<Store>,
    state: RwLock<State>,
}

impl Registry {
    /// Load the registry from the store.
    ///
    /// Duplicate ids keep their first occurrence and out-of-range intervals
    /// are clamped into bounds.
    pub fn load(store: Arc<Store>) -> Self {
        let mut issued = HashSet::new();
        let mut targets = Vec::new();

        for mut target in store.load() {
            if !issued.insert(target.id.clone()) {
                tracing::warn!("Dropping stored target with duplicate id {}", target.id);
                continue;
            }
            let clamped = target.interval_secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
            if clamped != target.interval_secs {
                tracing::warn!(
                    "Target {} had interval {}s, clamped to {}s",
                    target.name,
                    target.interval_secs,
                    clamped
                );
                target.interval_secs = clamped;
            }
            targets.push(target);
        }

        tracing::info!("Loaded {} targets", targets.len());

        Self {
            store,
            state: RwLock::new(State { targets, issued }),
        }
    }

    /// Snapshot of all targets, with history.
    pub async fn list(&self) -> Vec<Target> {
        self.state.read().await.targets.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Target> {
        let state = self.state.read().await;
        state.targets.iter().find(|t| t.id == id).cloned()
    }

    /// Validate input and register a new, active target.
    pub async fn create(
        &self,
        name: &str,
        url: &str,
        interval_secs: u32,
    ) -> Result<Target, RegistryError> {
        let name = validate_name(name)?;
        let url = validate_url(url)?;
        let interval_secs = validate_interval(interval_secs)?;

        let mut state = self.state.write().await;
        let id = generate_id(&mut rand::thread_rng(), &state.issued);
        state.issued.insert(id.clone());

        let target = Target::new(id, name, url, interval_secs);
        state.targets.push(target.clone());
        self.persist(&state.targets);

        tracing::info!("Registry: Added target {} ({})", target.name, target.id);
        Ok(target)
    }

    /// Remove a target, returning it.
    pub async fn delete(&self, id: &str) -> Result<Target, RegistryError> {
        let mut state = self.state.write().await;
        let index = state
            .targets
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let removed = state.targets.remove(index);
        self.persist(&state.targets);

        tracing::info!("Registry: Removed target {} ({})", removed.name, removed.id);
        Ok(removed)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<Target, RegistryError> {
        self.update(id, |t| t.is_active = active).await
    }

    /// Flip the active flag.
    pub async fn toggle(&self, id: &str) -> Result<Target, RegistryError> {
        self.update(id, |t| t.is_active = !t.is_active).await
    }

    pub async fn set_interval(&self, id: &str, interval_secs: u32) -> Result<Target, RegistryError> {
        let interval_secs = validate_interval(interval_secs)?;
        self.update(id, |t| t.interval_secs = interval_secs).await
    }

    /// Append a probe outcome to the target's history.
    ///
    /// Outcomes for paused targets are still recorded; outcomes for removed
    /// targets are rejected with `NotFound`.
    pub async fn record_outcome(&self, id: &str, outcome: Outcome) -> Result<(), RegistryError> {
        self.update(id, |t| t.history.append(outcome)).await?;
        Ok(())
    }

    async fn update<F>(&self, id: &str, apply: F) -> Result<Target, RegistryError>
    where
        F: FnOnce(&mut Target),
    {
        let mut state = self.state.write().await;
        let slot = state
            .targets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let mut updated = slot.clone();
        apply(&mut updated);
        *slot = updated.clone();

        self.persist(&state.targets);
        Ok(updated)
    }

    fn persist(&self, targets: &[Target]) {
        if let Err(e) = self.store.save_all(targets) {
            tracing::error!("Failed to persist targets: {}", e);
        }
    }
}

/// Random base-36 id not present in `issued`.
fn generate_id<R: Rng>(rng: &mut R, issued: &HashSet<TargetId>) -> TargetId {
    loop {
        let id: String = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        if !issued.contains(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProbeStatus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio_test::{assert_err, assert_ok};

    fn registry() -> (Arc<Store>, Registry) {
        let store = Arc::new(Store::in_memory().unwrap());
        let registry = Registry::load(store.clone());
        (store, registry)
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (_, registry) = registry();

        assert_eq!(
            registry.create("API", "https://example.com", 3).await,
            Err(RegistryError::Validation(ValidationError::IntervalOutOfRange(3)))
        );
        assert_err!(registry.create("API", "https://example.com", 3601).await);
        assert_err!(registry.create("", "https://example.com", 30).await);
        assert_err!(registry.create("API", "example.com", 30).await);
        assert!(registry.list().await.is_empty());

        let target = assert_ok!(registry.create("API", "https://example.com", 3600).await);
        assert_eq!(target.interval_secs, 3600);
        assert!(target.is_active);
        assert!(target.history.is_empty());
        assert_eq!(target.id.len(), ID_LEN);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let (store, registry) = registry();
        let target = registry.create("API", "https://example.com", 30).await.unwrap();
        registry
            .record_outcome(&target.id, Outcome::response(1, 200, 3))
            .await
            .unwrap();
        registry.set_active(&target.id, false).await.unwrap();

        let stored = store.load();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].is_active);
        assert_eq!(stored[0].history.len(), 1);

        let reloaded = Registry::load(store.clone());
        assert_eq!(reloaded.list().await, registry.list().await);

        registry.delete(&target.id).await.unwrap();
        assert!(store.load().is_empty());
    }

    #[tokio::test]
    async fn test_ids_never_reused() {
        let (_, registry) = registry();
        let mut seen = HashSet::new();
        for _ in 0..20 {
            let target = registry.create("API", "https://example.com", 30).await.unwrap();
            registry.delete(&target.id).await.unwrap();
            assert!(seen.insert(target.id));
        }
    }

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id(&mut rand::thread_rng(), &HashSet::new());
        assert_eq!(id.len(), ID_LEN);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_id_skips_issued() {
        let first = generate_id(&mut StdRng::seed_from_u64(7), &HashSet::new());

        // Same seed, so the first candidate collides and must be retried.
        let issued: HashSet<TargetId> = [first.clone()].into_iter().collect();
        let second = generate_id(&mut StdRng::seed_from_u64(7), &issued);
        assert_ne!(second, first);
        assert_eq!(second.len(), ID_LEN);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (_, registry) = registry();
        assert_eq!(
            registry.set_active("missing", true).await,
            Err(RegistryError::NotFound("missing".to_string()))
        );
        assert_err!(registry.delete("missing").await);
        assert_err!(
            registry
                .record_outcome("missing", Outcome::error(1, 1, "late"))
                .await
        );
    }

    #[tokio::test]
    async fn test_toggle_keeps_history() {
        let (_, registry) = registry();
        let target = registry.create("API", "https://example.com", 30).await.unwrap();
        registry
            .record_outcome(&target.id, Outcome::response(1, 500, 3))
            .await
            .unwrap();

        let paused = registry.toggle(&target.id).await.unwrap();
        assert!(!paused.is_active);
        assert_eq!(paused.history.len(), 1);

        // Outcomes arriving after a pause are still recorded.
        registry
            .record_outcome(&target.id, Outcome::response(2, 200, 3))
            .await
            .unwrap();
        let resumed = registry.toggle(&target.id).await.unwrap();
        assert!(resumed.is_active);
        assert_eq!(resumed.history.len(), 2);
        assert_eq!(resumed.history.last().map(|o| o.status), Some(ProbeStatus::Up));
    }

    #[tokio::test]
    async fn test_set_interval_validates() {
        let (_, registry) = registry();
        let target = registry.create("API", "https://example.com", 30).await.unwrap();

        assert_err!(registry.set_interval(&target.id, 4).await);
        let updated = registry.set_interval(&target.id, 10).await.unwrap();
        assert_eq!(updated.interval_secs, 10);
    }

    #[tokio::test]
    async fn test_load_sanitizes_stored_targets() {
        let store = Arc::new(Store::in_memory().unwrap());
        let mut first = Target::new("dup".into(), "A".into(), "https://a.example".into(), 1);
        first.history.append(Outcome::response(1, 200, 1));
        let second = Target::new("dup".into(), "B".into(), "https://b.example".into(), 30);
        store.save_all(&[first, second]).unwrap();

        let registry = Registry::load(store);
        let targets = registry.list().await;
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "A");
        assert_eq!(targets[0].interval_secs, MIN_INTERVAL_SECS);

        // A loaded id is never issued again.
        let created = registry.create("C", "https://c.example", 30).await.unwrap();
        assert_ne!(created.id, "dup");
    }
}
