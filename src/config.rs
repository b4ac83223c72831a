//! Process-wide fixture configuration.
//!
//! Both switches default to off. The value is passed into the
//! [`LifecycleController`](crate::lifecycle::LifecycleController) (and
//! through it, the runner) at construction. There is no ambient global
//! state, and the configuration cannot change mid-suite: declarations
//! record their mode when they are made.

/// Configuration switches for fixture fabrication.
///
/// # Example
///
/// ```rust
/// use prefab::FixtureConfig;
///
/// let config = FixtureConfig::default().with_reuse_initial_fabrication(true);
/// assert!(config.reuse_initial_fabrication);
/// assert!(!config.fabricate_per_test);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixtureConfig {
    /// Construct every declared fixture freshly for each test instead of
    /// sharing one fabrication across the group run. No transaction is
    /// opened and nothing is recorded as persisted.
    pub fabricate_per_test: bool,

    /// Seed the cache with the fabrication-time object so the first test
    /// of a group (and dependent constructors within the fabrication
    /// pass) skip the initial re-fetch.
    pub reuse_initial_fabrication: bool,
}

impl FixtureConfig {
    /// Set the per-test fabrication mode.
    pub fn with_fabricate_per_test(mut self, enabled: bool) -> Self {
        self.fabricate_per_test = enabled;
        self
    }

    /// Set the initial-fabrication reuse mode.
    pub fn with_reuse_initial_fabrication(mut self, enabled: bool) -> Self {
        self.reuse_initial_fabrication = enabled;
        self
    }
}
