//! Suite execution: the stand-in for the host framework's group/test
//! scheduler.
//!
//! [`SuiteRunner`] walks a declared scope tree and fires the lifecycle
//! registration points exactly as a host framework would: group start
//! (transaction + hooks + fabrication), before-each (cache clear and
//! per-test fabrication), the test bodies, then group end (rollback);
//! children recurse between the tests and the rollback, so nested
//! transactions unwind LIFO. Test-body errors are recorded as failures
//! in the [`RunReport`] without aborting the suite; lifecycle errors
//! abort the run, and an RAII guard still drives the rollback on that
//! path.

use std::sync::Arc;

use log::warn;
use serde::Serialize;

use crate::config::FixtureConfig;
use crate::context::Context;
use crate::error::FixtureError;
use crate::lifecycle::LifecycleController;
use crate::scope::{Scope, Suite};
use crate::store::ObjectStore;

/// One failed test body.
#[derive(Debug, Clone, Serialize)]
pub struct TestFailure {
    /// Path of the scope the test was registered on.
    pub scope: String,
    /// Test name.
    pub test: String,
    /// The body's error, rendered.
    pub message: String,
}

/// Outcome of one suite run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Groups whose lifecycle completed.
    pub groups_run: usize,
    /// Test bodies executed.
    pub tests_run: usize,
    /// Failed test bodies.
    pub failures: Vec<TestFailure>,
    /// Execution log, one line per event.
    pub log: Vec<String>,
}

impl RunReport {
    /// True when every executed test body passed.
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Pretty JSON for artifact capture.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn log(&mut self, line: String) {
        self.log.push(line);
    }
}

/// Executes suites against a store.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use prefab::prelude::*;
///
/// let suite = Suite::new(FixtureConfig::default());
/// let group = suite.root("things");
/// group.declare_fixture("thing", |ctx| Ok(ctx.create("thing", Attributes::new())?))?;
/// group.test("finds it", |ctx| {
///     let thing = ctx.fixture("thing")?;
///     anyhow::ensure!(thing.kind() == "thing");
///     Ok(())
/// });
///
/// let runner = SuiteRunner::new(Arc::new(MemoryStore::new()), suite.config());
/// let report = runner.run(&suite)?;
/// assert!(report.success());
/// ```
pub struct SuiteRunner {
    controller: LifecycleController,
}

impl SuiteRunner {
    /// Create a runner over a store with the given configuration.
    pub fn new(store: Arc<dyn ObjectStore>, config: FixtureConfig) -> Self {
        Self {
            controller: LifecycleController::new(store, config),
        }
    }

    /// Access the underlying controller.
    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    /// Run every top-level scope of the suite, each as one top-level
    /// group run.
    ///
    /// # Errors
    ///
    /// Returns the first lifecycle error (hook, constructor, store).
    /// Open transactions are rolled back before returning.
    pub fn run(&self, suite: &Suite) -> Result<RunReport, FixtureError> {
        let mut report = RunReport::default();
        for root in suite.roots() {
            let ctx = Context::new(root.clone(), self.controller.store_handle());
            self.run_scope(&root, &ctx, &mut report)?;
        }
        Ok(report)
    }

    fn run_scope(
        &self,
        scope: &Arc<Scope>,
        parent_ctx: &Context,
        report: &mut RunReport,
    ) -> Result<(), FixtureError> {
        let mut ctx = parent_ctx.fork(scope.clone());
        let guard = GroupGuard::new(&self.controller, scope.clone());

        self.controller.group_start(scope, &mut ctx)?;
        report.log(format!("group '{}' started", scope.path()));

        for test in scope.test_cases() {
            let mut test_ctx = ctx.fork(scope.clone());
            self.controller.before_test(scope, &mut test_ctx)?;
            report.tests_run += 1;
            match (test.body())(&mut test_ctx) {
                Ok(()) => report.log(format!("  PASS {}: {}", scope.path(), test.name())),
                Err(err) => {
                    report.log(format!("  FAIL {}: {}", scope.path(), test.name()));
                    report.failures.push(TestFailure {
                        scope: scope.path(),
                        test: test.name().to_string(),
                        message: format!("{err:#}"),
                    });
                }
            }
        }

        for child in scope.children() {
            self.run_scope(&child, &ctx, report)?;
        }

        guard.finish()?;
        report.groups_run += 1;
        report.log(format!("group '{}' rolled back", scope.path()));
        Ok(())
    }
}

/// Rolls the group back on every exit path. `finish` surfaces rollback
/// errors on the success path; the drop path only logs.
struct GroupGuard<'a> {
    controller: &'a LifecycleController,
    scope: Arc<Scope>,
    done: bool,
}

impl<'a> GroupGuard<'a> {
    fn new(controller: &'a LifecycleController, scope: Arc<Scope>) -> Self {
        Self {
            controller,
            scope,
            done: false,
        }
    }

    fn finish(mut self) -> Result<(), FixtureError> {
        self.done = true;
        self.controller.group_end(&self.scope)
    }
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            if let Err(err) = self.controller.group_end(&self.scope) {
                warn!("rollback failed for group '{}': {err}", self.scope.path());
            }
        }
    }
}
