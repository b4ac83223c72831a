//! Per-scope fixture run state.
//!
//! One `FixtureState` is allocated lazily by the first declaration in a
//! scope. The descriptor table lives for the process; the cache and
//! persisted table are logically scoped to one group run. Nested
//! callbacks never capture this state; lifecycle code receives it
//! through the owning scope.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::Context;
use crate::error::FixtureError;
use crate::lifecycle::RunPhase;
use crate::store::{ObjectId, Record};

/// Zero-argument fixture constructor, evaluated in the group context.
pub type Constructor = Arc<dyn Fn(&mut Context) -> anyhow::Result<Record> + Send + Sync>;

/// One `(name, constructor)` declaration. The mode is recorded at
/// declaration time, so it cannot change mid-suite.
#[derive(Clone)]
pub(crate) struct Descriptor {
    pub(crate) name: String,
    pub(crate) constructor: Constructor,
    pub(crate) per_test: bool,
}

/// Persisted identity of a fabricated fixture, valid for the run.
struct PersistedRef {
    kind: String,
    id: ObjectId,
}

/// Run state attached to a scope that declares fixtures.
pub(crate) struct FixtureState {
    descriptors: Mutex<Vec<Descriptor>>,
    cache: Mutex<HashMap<String, Arc<Record>>>,
    persisted: Mutex<HashMap<String, PersistedRef>>,
    phase: Mutex<RunPhase>,
    // Set when fabrication seeded the cache; protects the seed from the
    // first per-test clear.
    fresh: Mutex<bool>,
}

impl FixtureState {
    pub(crate) fn new() -> Self {
        Self {
            descriptors: Mutex::new(Vec::new()),
            cache: Mutex::new(HashMap::new()),
            persisted: Mutex::new(HashMap::new()),
            phase: Mutex::new(RunPhase::Idle),
            fresh: Mutex::new(false),
        }
    }

    /// Append a descriptor, rejecting duplicate names within the scope.
    pub(crate) fn declare(
        &self,
        name: String,
        constructor: Constructor,
        per_test: bool,
    ) -> Result<(), FixtureError> {
        let mut descriptors = self.descriptors.lock();
        if descriptors.iter().any(|d| d.name == name) {
            return Err(FixtureError::Duplicate { name });
        }
        descriptors.push(Descriptor {
            name,
            constructor,
            per_test,
        });
        Ok(())
    }

    pub(crate) fn declares(&self, name: &str) -> bool {
        self.descriptors.lock().iter().any(|d| d.name == name)
    }

    /// Shared-mode descriptors in declaration order.
    pub(crate) fn shared_descriptors(&self) -> Vec<Descriptor> {
        self.descriptors
            .lock()
            .iter()
            .filter(|d| !d.per_test)
            .cloned()
            .collect()
    }

    /// Per-test descriptors in declaration order.
    pub(crate) fn per_test_descriptors(&self) -> Vec<Descriptor> {
        self.descriptors
            .lock()
            .iter()
            .filter(|d| d.per_test)
            .cloned()
            .collect()
    }

    pub(crate) fn has_shared(&self) -> bool {
        self.descriptors.lock().iter().any(|d| !d.per_test)
    }

    pub(crate) fn cached(&self, name: &str) -> Option<Arc<Record>> {
        self.cache.lock().get(name).cloned()
    }

    pub(crate) fn cache_insert(&self, name: &str, record: Arc<Record>) {
        self.cache.lock().insert(name.to_string(), record);
    }

    pub(crate) fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    pub(crate) fn persisted_ref(&self, name: &str) -> Option<(String, ObjectId)> {
        self.persisted
            .lock()
            .get(name)
            .map(|p| (p.kind.clone(), p.id))
    }

    pub(crate) fn record_persisted(&self, name: &str, kind: &str, id: ObjectId) {
        self.persisted.lock().insert(
            name.to_string(),
            PersistedRef {
                kind: kind.to_string(),
                id,
            },
        );
    }

    pub(crate) fn phase(&self) -> RunPhase {
        *self.phase.lock()
    }

    pub(crate) fn set_phase(&self, phase: RunPhase) {
        *self.phase.lock() = phase;
    }

    /// Wipe run state at the start of a (re)run.
    pub(crate) fn reset_for_run(&self) {
        self.cache.lock().clear();
        self.persisted.lock().clear();
        *self.fresh.lock() = false;
    }

    pub(crate) fn mark_fresh(&self) {
        *self.fresh.lock() = true;
    }

    /// Consume the fresh flag. True exactly once after a seeding
    /// fabrication.
    pub(crate) fn take_fresh(&self) -> bool {
        std::mem::take(&mut *self.fresh.lock())
    }
}
