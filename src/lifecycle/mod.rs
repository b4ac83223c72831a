//! The per-run lifecycle state machine.
//!
//! For each scope that declares shared fixtures, one group run moves
//! through `Idle → TransactionOpen → Fabricating → Ready → RolledBack`:
//! a non-joinable transaction opens, the inherited before-hook runs,
//! descriptors are constructed in declaration order, the inherited
//! after-hook runs, tests execute with a cache clear before each one,
//! and the transaction rolls back at group end. Nothing here suspends;
//! execution is synchronous and single-threaded within a run.

use std::sync::Arc;

use log::debug;

use crate::config::FixtureConfig;
use crate::context::Context;
use crate::error::FixtureError;
use crate::scope::Scope;
use crate::store::ObjectStore;

/// Phase of one group run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// No run has started (or a prior run finished and was reset).
    Idle,
    /// The group's transaction is open; the before-hook has not finished.
    TransactionOpen,
    /// Descriptors are being constructed.
    Fabricating,
    /// Fabrication complete; tests may execute.
    Ready,
    /// The transaction rolled back; persisted identifiers are dangling.
    RolledBack,
}

/// Orchestrates group runs against a scope tree.
///
/// Configuration is threaded in at construction; there are no ambient
/// globals. The controller holds the store handle used for the
/// transaction boundary and for re-fetches.
pub struct LifecycleController {
    store: Arc<dyn ObjectStore>,
    config: FixtureConfig,
}

impl LifecycleController {
    /// Create a controller for one store and configuration.
    pub fn new(store: Arc<dyn ObjectStore>, config: FixtureConfig) -> Self {
        Self { store, config }
    }

    /// The configuration in effect.
    pub fn config(&self) -> FixtureConfig {
        self.config
    }

    /// The store this controller transacts against.
    pub fn store_handle(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    /// Group-run start: open a non-joinable transaction, run the
    /// resolved before-hook, construct this scope's shared descriptors
    /// in declaration order, run the resolved after-hook.
    ///
    /// Scopes without shared descriptors have no group-level lifecycle
    /// and return immediately. A scope whose previous run rolled back
    /// may start again with fresh state.
    ///
    /// # Errors
    ///
    /// Hook and constructor failures abort fabrication with the phase
    /// left mid-run; the caller must still drive
    /// [`group_end`](LifecycleController::group_end) so the transaction
    /// is rolled back on every exit path.
    pub fn group_start(&self, scope: &Arc<Scope>, ctx: &mut Context) -> Result<(), FixtureError> {
        let Some(state) = scope.fixtures() else {
            return Ok(());
        };
        if !state.has_shared() {
            return Ok(());
        }
        match state.phase() {
            RunPhase::Idle | RunPhase::RolledBack => {}
            _ => return Err(FixtureError::Lifecycle("group_start while a run is open")),
        }

        state.reset_for_run();
        self.store.begin_transaction(false)?;
        state.set_phase(RunPhase::TransactionOpen);
        debug!("group '{}': transaction open", scope.path());

        scope.before_hook().run(ctx)?;
        state.set_phase(RunPhase::Fabricating);

        for descriptor in state.shared_descriptors() {
            let record =
                (descriptor.constructor)(ctx).map_err(|source| FixtureError::Construction {
                    name: descriptor.name.clone(),
                    source,
                })?;
            state.record_persisted(&descriptor.name, record.kind(), record.id());
            debug!(
                "group '{}': fabricated '{}' as {} #{}",
                scope.path(),
                descriptor.name,
                record.kind(),
                record.id()
            );
            if self.config.reuse_initial_fabrication {
                state.cache_insert(&descriptor.name, Arc::new(record));
                state.mark_fresh();
            }
        }

        scope.after_hook().run(ctx)?;
        state.set_phase(RunPhase::Ready);
        Ok(())
    }

    /// Before each test: clear the fixture cache of every scope on the
    /// root→leaf chain, forcing re-fetch by identifier, then construct
    /// per-test descriptors into the caches.
    ///
    /// A cache freshly seeded by a reusing fabrication survives its
    /// first clear, so the first test reuses the fabrication-time
    /// objects.
    pub fn before_test(&self, scope: &Arc<Scope>, ctx: &mut Context) -> Result<(), FixtureError> {
        let chain = scope.ancestry();

        for member in &chain {
            if let Some(state) = member.fixtures() {
                if state.take_fresh() {
                    continue;
                }
                state.clear_cache();
            }
        }

        for member in &chain {
            if let Some(state) = member.fixtures() {
                for descriptor in state.per_test_descriptors() {
                    let record = (descriptor.constructor)(ctx).map_err(|source| {
                        FixtureError::Construction {
                            name: descriptor.name.clone(),
                            source,
                        }
                    })?;
                    state.cache_insert(&descriptor.name, Arc::new(record));
                }
            }
        }
        Ok(())
    }

    /// Group-run end: roll back the transaction, discarding every write
    /// made by fabrication and by tests. Idempotent: a scope with no
    /// open run is left untouched, so cleanup paths may call this
    /// unconditionally.
    pub fn group_end(&self, scope: &Arc<Scope>) -> Result<(), FixtureError> {
        let Some(state) = scope.fixtures() else {
            return Ok(());
        };
        if !state.has_shared() {
            return Ok(());
        }
        match state.phase() {
            RunPhase::TransactionOpen | RunPhase::Fabricating | RunPhase::Ready => {
                self.store.rollback_transaction()?;
                state.set_phase(RunPhase::RolledBack);
                debug!("group '{}': rolled back", scope.path());
                Ok(())
            }
            RunPhase::Idle | RunPhase::RolledBack => Ok(()),
        }
    }
}
