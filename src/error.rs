//! Error types surfaced by the fixture lifecycle.
//!
//! Callback and constructor payloads are `anyhow::Result`s; the lifecycle
//! wraps their failures into the typed kinds below. None of these are
//! recovered internally; they propagate to the caller's failure
//! reporting. Construction is assumed deterministic and side-effecting,
//! so nothing is retried.

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised by fixture declaration, fabrication, and access.
#[derive(Error, Debug)]
pub enum FixtureError {
    /// A fixture constructor returned an error during fabrication.
    ///
    /// The group run aborts; no partial fixture state is published.
    #[error("constructor for fixture '{name}' failed: {source}")]
    Construction {
        /// Name of the fixture whose constructor failed
        name: String,
        /// The constructor's own error
        source: anyhow::Error,
    },

    /// A before/after lifecycle callback returned an error.
    #[error("lifecycle hook failed: {source}")]
    Hook {
        /// The callback's own error
        source: anyhow::Error,
    },

    /// An accessor was called for a name with no declaration in the
    /// scope chain. Programming error; fails fast instead of yielding
    /// a silent nil-equivalent.
    #[error("no fixture named '{0}' is declared in this scope or any ancestor")]
    Unresolved(String),

    /// An accessor was called for a declared fixture before its group
    /// run fabricated it.
    #[error("fixture '{name}' was accessed before fabrication")]
    NotFabricated {
        /// Name of the fixture
        name: String,
    },

    /// An accessor was called after the owning run rolled back.
    ///
    /// The persisted identifiers are dangling at that point, so this is
    /// reported as an error rather than returning stale data.
    #[error("fixture '{name}' was accessed after its group run rolled back")]
    Stale {
        /// Name of the fixture
        name: String,
    },

    /// A fixture name was declared twice in the same scope.
    #[error("fixture '{name}' is already declared in this scope")]
    Duplicate {
        /// The re-declared name
        name: String,
    },

    /// A group lifecycle transition was requested out of order.
    #[error("group lifecycle violation: {0}")]
    Lifecycle(&'static str),

    /// The object store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
