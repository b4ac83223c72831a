//! Composable before/after lifecycle hooks.
//!
//! A [`Hook`] is an ordered callback list with an optional predecessor
//! (run strictly before its own callbacks) and an optional successor
//! (run strictly after). Scopes chain their hooks to the nearest
//! ancestor's, so before-hooks nest outside-in and after-hooks nest
//! inside-out: teardown pairs LIFO with setup across the ancestor chain.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::Context;
use crate::error::FixtureError;

/// Callback invoked with the active test context.
pub type HookCallback = Arc<dyn Fn(&mut Context) -> anyhow::Result<()> + Send + Sync>;

/// A single before/after callback unit, composable into a chain.
///
/// Callback lists are interior-mutable: registering on an ancestor after
/// a descendant has already resolved its chain still takes effect,
/// because the chain links shared hook objects. Registration after a run
/// has begun for the owning scope is unsupported.
pub struct Hook {
    predecessor: Option<Arc<Hook>>,
    successor: Option<Arc<Hook>>,
    callbacks: Mutex<Vec<HookCallback>>,
}

impl Hook {
    /// A hook with no links, the chain root.
    pub fn leaf() -> Arc<Self> {
        Arc::new(Self {
            predecessor: None,
            successor: None,
            callbacks: Mutex::new(Vec::new()),
        })
    }

    /// A before-hook: `predecessor` runs first, then own callbacks.
    pub fn wrapping(predecessor: Arc<Hook>) -> Arc<Self> {
        Arc::new(Self {
            predecessor: Some(predecessor),
            successor: None,
            callbacks: Mutex::new(Vec::new()),
        })
    }

    /// An after-hook: own callbacks run first, then `successor`.
    pub fn wrapped_by(successor: Arc<Hook>) -> Arc<Self> {
        Arc::new(Self {
            predecessor: None,
            successor: Some(successor),
            callbacks: Mutex::new(Vec::new()),
        })
    }

    /// Append a callback. Callbacks run in registration order.
    pub fn add_callback<F>(&self, callback: F)
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks.lock().push(Arc::new(callback));
    }

    /// Number of callbacks registered directly on this hook.
    pub fn callback_count(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Execute the chain: predecessor, own callbacks in registration
    /// order, successor. The first error aborts the remainder.
    pub fn run(&self, ctx: &mut Context) -> Result<(), FixtureError> {
        if let Some(predecessor) = &self.predecessor {
            predecessor.run(ctx)?;
        }

        // Clone the list out so callbacks run without the lock held.
        let callbacks: Vec<HookCallback> = self.callbacks.lock().clone();
        for callback in callbacks {
            callback(ctx).map_err(|source| FixtureError::Hook { source })?;
        }

        if let Some(successor) = &self.successor {
            successor.run(ctx)?;
        }
        Ok(())
    }
}
