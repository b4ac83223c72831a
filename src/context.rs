//! The execution environment handed to callbacks, constructors, and
//! test bodies.
//!
//! A [`Context`] carries the current scope, the object store handle, and
//! instance-level scratch state. Scratch writes made during fabrication
//! are inherited by every test context forked under the group, which is
//! how before/after-prefabrication hooks communicate with test bodies;
//! writes made inside one test body stay in that test's fork.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::FixtureError;
use crate::scope::{self, Scope};
use crate::store::{Attributes, ObjectStore, Record, StoreError};

/// Receiver/environment for fixture constructors, hook callbacks, and
/// test bodies.
pub struct Context {
    scope: Arc<Scope>,
    store: Arc<dyn ObjectStore>,
    scratch: BTreeMap<String, Value>,
}

impl Context {
    /// Create a context bound to a scope and a store.
    pub fn new(scope: Arc<Scope>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            scope,
            store,
            scratch: BTreeMap::new(),
        }
    }

    /// Fork for a nested scope or an individual test, inheriting the
    /// current scratch state.
    pub(crate) fn fork(&self, scope: Arc<Scope>) -> Self {
        Self {
            scope,
            store: self.store.clone(),
            scratch: self.scratch.clone(),
        }
    }

    /// The scope this context is bound to.
    pub fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    /// The object store handle.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Resolve a fixture by name against the scope chain.
    ///
    /// Cache hits return the identical in-memory object; misses re-fetch
    /// from the store by the persisted `(kind, id)` and cache the result
    /// on the declaring scope.
    pub fn fixture(&self, name: &str) -> Result<Arc<Record>, FixtureError> {
        scope::resolve_fixture(&self.scope, name, self.store.as_ref())
    }

    /// Create a row through the store. Convenience for constructors.
    pub fn create(&self, kind: &str, attrs: Attributes) -> Result<Record, StoreError> {
        self.store.create(kind, attrs)
    }

    /// Read a scratch value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.scratch.get(key)
    }

    /// Write a scratch value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.scratch.insert(key.into(), value.into());
    }

    /// Append to a scratch array, creating it if absent. The idiom for
    /// event traces shared between hooks and test bodies.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let entry = self
            .scratch
            .entry(key.into())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(value.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixtureConfig;
    use crate::scope::Suite;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn context() -> Context {
        let suite = Suite::new(FixtureConfig::default());
        let scope = suite.root("ctx");
        Context::new(scope, Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_scratch_set_and_get() {
        let mut ctx = context();
        ctx.set("count", json!(3));
        assert_eq!(ctx.get("count"), Some(&json!(3)));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn test_push_creates_and_appends() {
        let mut ctx = context();
        ctx.push("events", json!("a"));
        ctx.push("events", json!("b"));
        assert_eq!(ctx.get("events"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_fork_inherits_scratch_without_leaking_back() {
        let mut ctx = context();
        ctx.set("inherited", json!(true));

        let mut forked = ctx.fork(ctx.scope().clone());
        assert_eq!(forked.get("inherited"), Some(&json!(true)));

        forked.set("local", json!(1));
        assert_eq!(ctx.get("local"), None);
    }

    #[test]
    fn test_create_goes_through_the_store() {
        let ctx = context();
        let record = ctx.create("thing", Attributes::new()).unwrap();
        assert_eq!(ctx.store().count("thing"), 1);
        assert_eq!(record.kind(), "thing");
    }
}
