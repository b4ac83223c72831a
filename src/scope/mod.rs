//! The scope tree: nested test groups with inherited hook chains and
//! fixture declarations.
//!
//! A [`Suite`] owns the top-level scopes and the process-wide global
//! hook pair. Each [`Scope`] holds a weak reference to its parent, owns
//! its children, and memoizes its resolved before/after hook chain on
//! first access. Fixture resolution walks self-then-ancestors to the
//! nearest declaring scope (never siblings or cousins), so a name
//! declared in a parent is visible to every descendant, and a child's
//! re-declaration shadows.

mod state;

pub use state::Constructor;
pub(crate) use state::FixtureState;

use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use crate::config::FixtureConfig;
use crate::context::Context;
use crate::error::FixtureError;
use crate::hook::Hook;
use crate::lifecycle::RunPhase;
use crate::store::{ObjectStore, Record};

/// Test body registered on a scope.
pub type TestFn = Arc<dyn Fn(&mut Context) -> anyhow::Result<()> + Send + Sync>;

/// A named test case. The runner treats a body error as a test failure,
/// not a lifecycle error.
#[derive(Clone)]
pub struct TestCase {
    name: String,
    run: TestFn,
}

impl TestCase {
    /// Test name as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The test body.
    pub fn body(&self) -> &TestFn {
        &self.run
    }
}

/// Root of a suite: global prefabrication hooks, configuration, and the
/// top-level scopes.
///
/// # Example
///
/// ```rust
/// use prefab::{FixtureConfig, Suite};
///
/// let suite = Suite::new(FixtureConfig::default());
/// let group = suite.root("widgets");
/// let nested = group.child("with an owner");
/// assert_eq!(nested.path(), "widgets/with an owner");
/// ```
pub struct Suite {
    config: FixtureConfig,
    global_before: Arc<Hook>,
    global_after: Arc<Hook>,
    roots: Mutex<Vec<Arc<Scope>>>,
}

impl Suite {
    /// Create a suite with the given configuration.
    pub fn new(config: FixtureConfig) -> Self {
        Self {
            config,
            global_before: Hook::leaf(),
            global_after: Hook::leaf(),
            roots: Mutex::new(Vec::new()),
        }
    }

    /// Declare a top-level scope.
    pub fn root(&self, label: impl Into<String>) -> Arc<Scope> {
        let scope = Arc::new(Scope {
            label: label.into(),
            parent: Weak::new(),
            config: self.config,
            global_before: self.global_before.clone(),
            global_after: self.global_after.clone(),
            children: Mutex::new(Vec::new()),
            tests: Mutex::new(Vec::new()),
            before_hook: OnceLock::new(),
            after_hook: OnceLock::new(),
            fixtures: OnceLock::new(),
        });
        self.roots.lock().push(scope.clone());
        scope
    }

    /// Register a callback on the global before-prefabrication hook.
    /// Runs before every scope's own before-callbacks, in every group
    /// that fabricates.
    pub fn before_prefabrication<F>(&self, callback: F)
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.global_before.add_callback(callback);
    }

    /// Register a callback on the global after-prefabrication hook.
    pub fn after_prefabrication<F>(&self, callback: F)
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.global_after.add_callback(callback);
    }

    /// The declared top-level scopes, in declaration order.
    pub fn roots(&self) -> Vec<Arc<Scope>> {
        self.roots.lock().clone()
    }

    /// The suite configuration.
    pub fn config(&self) -> FixtureConfig {
        self.config
    }
}

/// A node in the scope tree.
///
/// Scopes are created at suite-definition time and persist for the
/// process; fixture run state is allocated by the first declaration and
/// reset per run.
pub struct Scope {
    label: String,
    parent: Weak<Scope>,
    config: FixtureConfig,
    global_before: Arc<Hook>,
    global_after: Arc<Hook>,
    children: Mutex<Vec<Arc<Scope>>>,
    tests: Mutex<Vec<TestCase>>,
    before_hook: OnceLock<Arc<Hook>>,
    after_hook: OnceLock<Arc<Hook>>,
    fixtures: OnceLock<FixtureState>,
}

impl Scope {
    /// Label given at declaration.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<Arc<Scope>> {
        self.parent.upgrade()
    }

    /// Declare a nested scope.
    pub fn child(self: &Arc<Self>, label: impl Into<String>) -> Arc<Scope> {
        let child = Arc::new(Scope {
            label: label.into(),
            parent: Arc::downgrade(self),
            config: self.config,
            global_before: self.global_before.clone(),
            global_after: self.global_after.clone(),
            children: Mutex::new(Vec::new()),
            tests: Mutex::new(Vec::new()),
            before_hook: OnceLock::new(),
            after_hook: OnceLock::new(),
            fixtures: OnceLock::new(),
        });
        self.children.lock().push(child.clone());
        child
    }

    /// Child scopes in declaration order.
    pub fn children(&self) -> Vec<Arc<Scope>> {
        self.children.lock().clone()
    }

    /// Ancestor chain root→self, labels joined with `/`.
    pub fn path(self: &Arc<Self>) -> String {
        self.ancestry()
            .iter()
            .map(|s| s.label.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Scopes from the root down to and including self.
    pub(crate) fn ancestry(self: &Arc<Self>) -> Vec<Arc<Scope>> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(scope) = current {
            current = scope.parent();
            chain.push(scope);
        }
        chain.reverse();
        chain
    }

    /// The scope's resolved before-hook, built on first access by
    /// wrapping the nearest ancestor's (the global hook at the root)
    /// and cached for the scope's lifetime.
    pub fn before_hook(self: &Arc<Self>) -> Arc<Hook> {
        self.before_hook
            .get_or_init(|| {
                let predecessor = match self.parent() {
                    Some(parent) => parent.before_hook(),
                    None => self.global_before.clone(),
                };
                Hook::wrapping(predecessor)
            })
            .clone()
    }

    /// The scope's resolved after-hook; symmetric to
    /// [`before_hook`](Scope::before_hook), ancestor behavior runs
    /// strictly after own callbacks.
    pub fn after_hook(self: &Arc<Self>) -> Arc<Hook> {
        self.after_hook
            .get_or_init(|| {
                let successor = match self.parent() {
                    Some(parent) => parent.after_hook(),
                    None => self.global_after.clone(),
                };
                Hook::wrapped_by(successor)
            })
            .clone()
    }

    /// Register a callback to run before fabrication for this scope and
    /// its descendants. Must happen before the scope's first run.
    pub fn before_lifecycle<F>(self: &Arc<Self>, callback: F)
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.before_hook().add_callback(callback);
    }

    /// Register a callback to run after fabrication for this scope and
    /// its descendants.
    pub fn after_lifecycle<F>(self: &Arc<Self>, callback: F)
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after_hook().add_callback(callback);
    }

    /// Declare a fixture: a name and a constructor evaluated later in
    /// the group context. Re-declaring a name in the same scope is an
    /// error; shadowing an ancestor's name is allowed and wins here and
    /// below.
    pub fn declare_fixture<F>(
        &self,
        name: impl Into<String>,
        constructor: F,
    ) -> Result<(), FixtureError>
    where
        F: Fn(&mut Context) -> anyhow::Result<Record> + Send + Sync + 'static,
    {
        let state = self.fixtures.get_or_init(FixtureState::new);
        state.declare(
            name.into(),
            Arc::new(constructor),
            self.config.fabricate_per_test,
        )
    }

    /// True when an accessor call for `name` would resolve, here or in
    /// an ancestor.
    pub fn resolves(&self, name: &str) -> bool {
        if let Some(state) = self.fixtures.get() {
            if state.declares(name) {
                return true;
            }
        }
        match self.parent() {
            Some(parent) => parent.resolves(name),
            None => false,
        }
    }

    /// Register a test case.
    pub fn test<F>(&self, name: impl Into<String>, body: F)
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.tests.lock().push(TestCase {
            name: name.into(),
            run: Arc::new(body),
        });
    }

    /// Registered test cases in declaration order.
    pub fn test_cases(&self) -> Vec<TestCase> {
        self.tests.lock().clone()
    }

    pub(crate) fn fixtures(&self) -> Option<&FixtureState> {
        self.fixtures.get()
    }
}

/// Generic accessor resolution keyed by name: find the nearest
/// ancestor-or-self scope declaring `name`, then serve from its cache or
/// re-fetch by the persisted `(kind, id)`.
pub(crate) fn resolve_fixture(
    scope: &Arc<Scope>,
    name: &str,
    store: &dyn ObjectStore,
) -> Result<Arc<Record>, FixtureError> {
    let mut current = Some(scope.clone());
    while let Some(candidate) = current {
        if let Some(state) = candidate.fixtures() {
            if state.declares(name) {
                if state.phase() == RunPhase::RolledBack {
                    return Err(FixtureError::Stale {
                        name: name.to_string(),
                    });
                }
                if let Some(cached) = state.cached(name) {
                    return Ok(cached);
                }
                let Some((kind, id)) = state.persisted_ref(name) else {
                    return Err(FixtureError::NotFabricated {
                        name: name.to_string(),
                    });
                };
                let record = Arc::new(store.fetch(&kind, id)?);
                log::trace!("fixture '{}' re-fetched as {} #{}", name, kind, id);
                state.cache_insert(name, record.clone());
                return Ok(record);
            }
        }
        current = candidate.parent();
    }
    Err(FixtureError::Unresolved(name.to_string()))
}
