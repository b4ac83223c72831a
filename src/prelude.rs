//! Convenient re-exports for common usage.
//!
//! ```rust,ignore
//! use prefab::prelude::*;
//! ```

pub use crate::config::FixtureConfig;
pub use crate::context::Context;
pub use crate::error::FixtureError;
pub use crate::hook::Hook;
pub use crate::lifecycle::{LifecycleController, RunPhase};
pub use crate::runner::{RunReport, SuiteRunner};
pub use crate::scope::{Scope, Suite};
pub use crate::store::{Attributes, MemoryStore, ObjectId, ObjectStore, Record, StoreError};
