mod conflict;
mod error;

pub use conflict::{allocate, Allocation};
pub use error::EngineError;

use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::model::*;
use crate::observability::{SLOTS_ACTIVE, SUBMISSIONS_TOTAL, SUBMIT_DURATION_SECONDS};

use conflict::validate_range;

#[derive(Debug, Default)]
struct StoreState {
    /// Insertion order; no two same-owner entries overlap.
    slots: Vec<Slot>,
    /// Last id handed out. Never decremented, so retired ids are never reused.
    last_id: u64,
}

impl StoreState {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    /// Drop every retired slot and append `slot`, preserving the order of survivors.
    fn commit(&mut self, retired: &[u64], slot: Slot) {
        if !retired.is_empty() {
            self.slots.retain(|s| !retired.contains(&s.id));
        }
        self.slots.push(slot);
    }
}

/// Authoritative slot collection. Share it as `Arc<SlotStore>`; all mutation goes through
/// [`SlotStore::submit`], which holds the write lock for the whole decide-and-commit step.
#[derive(Debug, Default)]
pub struct SlotStore {
    state: RwLock<StoreState>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every slot in insertion order.
    pub async fn list(&self) -> Vec<Slot> {
        self.state.read().await.slots.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Validate, allocate and commit one submission for `owner`.
    ///
    /// On success the returned slot is already visible to `list`. On failure the store is
    /// untouched.
    pub async fn submit(
        &self,
        owner: &str,
        start_raw: Option<&str>,
        end_raw: Option<&str>,
    ) -> Result<Slot, EngineError> {
        let started = Instant::now();
        let result = self.submit_inner(owner, start_raw, end_raw).await;
        metrics::histogram!(SUBMIT_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        result
    }

    async fn submit_inner(
        &self,
        owner: &str,
        start_raw: Option<&str>,
        end_raw: Option<&str>,
    ) -> Result<Slot, EngineError> {
        let candidate = validate_range(start_raw, end_raw).inspect_err(|e| {
            debug!("rejected submission from '{owner}': {e}");
            metrics::counter!(SUBMISSIONS_TOTAL, "outcome" => "invalid").increment(1);
        })?;

        let mut guard = self.state.write().await;
        let plan = allocate(owner, candidate, &guard.slots).inspect_err(|e| {
            warn!("submission from '{owner}' rejected: {e}");
            metrics::counter!(SUBMISSIONS_TOTAL, "outcome" => "conflict").increment(1);
        })?;

        let id = guard.next_id();
        let slot = Slot::available(id, owner.to_string(), plan.range);
        guard.commit(&plan.retired, slot.clone());
        let active = guard.slots.len();
        drop(guard);

        if plan.is_merge() {
            info!(
                "slot {id} created for '{owner}', merged {} existing slot(s): {:?}",
                plan.retired.len(),
                plan.retired
            );
            metrics::counter!(SUBMISSIONS_TOTAL, "outcome" => "merged").increment(1);
        } else {
            info!("slot {id} created for '{owner}'");
            metrics::counter!(SUBMISSIONS_TOTAL, "outcome" => "created").increment(1);
        }
        metrics::gauge!(SLOTS_ACTIVE).set(active as f64);
        Ok(slot)
    }
}
