//! # prefab: transactional fixture prefabrication
//!
//! A fixture lifecycle manager for test suites organized as nested
//! scopes. Expensive fixture objects are declared by name, constructed
//! at most once per top-level group run inside one transaction, and
//! resolved transparently by name from any test or nested scope under
//! the declaring scope. Mutations one test makes to a fixture never
//! leak into the next: the per-scope cache is cleared before every test
//! so each access re-fetches a fresh copy from the store, and the whole
//! group's writes are discarded by rollback at group end.
//!
//! ## Architecture Overview
//!
//! - **Scope tree** ([`scope`]): nested groups with weak parent links,
//!   per-scope descriptor tables, and generic accessor resolution.
//! - **Hook chains** ([`hook`]): before-hooks nest outside-in,
//!   after-hooks inside-out, memoized per scope.
//! - **Lifecycle** ([`lifecycle`]): the
//!   `Idle → TransactionOpen → Fabricating → Ready → RolledBack`
//!   state machine per group run.
//! - **Store boundary** ([`store`]): the transactional object store
//!   trait plus an in-memory implementation for tests and demos.
//! - **Runner** ([`runner`]): walks a suite the way a host framework
//!   would and collects a report.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prefab::prelude::*;
//!
//! let suite = Suite::new(FixtureConfig::default());
//! let group = suite.root("widgets");
//! group.declare_fixture("widget", |ctx| {
//!     Ok(ctx.create("widget", Attributes::new())?)
//! })?;
//! group.test("resolves the widget", |ctx| {
//!     let widget = ctx.fixture("widget")?;
//!     anyhow::ensure!(widget.kind() == "widget");
//!     Ok(())
//! });
//!
//! let runner = SuiteRunner::new(Arc::new(MemoryStore::new()), suite.config());
//! assert!(runner.run(&suite)?.success());
//! ```
//!
//! ## Design Principles
//!
//! 1. **One fabrication per run**: constructors execute once per group
//!    run, in declaration order, inside a non-joinable transaction.
//! 2. **Isolation without reconstruction**: tests share the persisted
//!    row but never each other's in-memory mutations.
//! 3. **Explicit configuration**: the two mode switches are a value
//!    threaded into the controller, not ambient globals.
//! 4. **Fail fast**: unresolved, unfabricated, and post-rollback
//!    accesses are typed errors, never silent stale data.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Process-wide fixture configuration switches
pub mod config;
// Execution environment for callbacks, constructors, and test bodies
pub mod context;
// Typed error kinds for declaration, fabrication, and access
pub mod error;
// Composable before/after hook chains
pub mod hook;
// The per-run lifecycle state machine
pub mod lifecycle;
// Suite execution and run reports
pub mod runner;
// The scope tree and fixture declaration surface
pub mod scope;
// Object store interface boundary and in-memory stand-in
pub mod store;

// Convenient re-exports for common usage
pub mod prelude;

// Re-export commonly used types at crate root
pub use config::FixtureConfig;
pub use context::Context;
pub use error::FixtureError;
pub use hook::Hook;
pub use lifecycle::{LifecycleController, RunPhase};
pub use runner::{RunReport, SuiteRunner};
pub use scope::{Scope, Suite};
pub use store::{MemoryStore, ObjectStore, Record};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
