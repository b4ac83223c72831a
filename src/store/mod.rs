//! Object store interface boundary.
//!
//! The fixture lifecycle does not own a persistence engine; it consumes
//! one through [`ObjectStore`]: transactional rollback plus re-fetch by
//! `(kind, id)`. Constructors create rows through the same handle. The
//! in-memory [`MemoryStore`] implements the trait for tests and demos.

mod memory;

pub use memory::MemoryStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Row identifier assigned by the store at creation.
pub type ObjectId = u64;

/// Attribute map of a stored row. Values are JSON so tests can carry
/// arbitrary scalar and structured data without a schema.
pub type Attributes = BTreeMap<String, Value>;

/// Errors raised by an object store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No row exists for the given kind and identifier. Also the outcome
    /// of fetching a rolled-back row in a later run.
    #[error("no {kind} record with id {id}")]
    NotFound {
        /// Row kind
        kind: String,
        /// Row identifier
        id: ObjectId,
    },

    /// `rollback_transaction` was called with no transaction open.
    #[error("no open transaction to roll back")]
    NoTransaction,
}

/// A stored object: a kind, a store-assigned identifier, and attributes.
///
/// Fetches return fresh copies; mutating a fetched record changes only
/// the copy until it is explicitly written back with
/// [`ObjectStore::update`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    kind: String,
    id: ObjectId,
    attrs: Attributes,
}

impl Record {
    /// Assemble a record. Stores call this; user code receives records
    /// from [`ObjectStore::create`] and [`ObjectStore::fetch`].
    pub fn new(kind: impl Into<String>, id: ObjectId, attrs: Attributes) -> Self {
        Self {
            kind: kind.into(),
            id,
            attrs,
        }
    }

    /// Row kind, e.g. `"thing"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Store-assigned identifier.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Read one attribute.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attrs.get(field)
    }

    /// Write one attribute on this copy.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(field.into(), value.into());
    }

    /// All attributes.
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }
}

/// Transactional object store consumed by the fixture lifecycle.
///
/// Implementations must support nested transactions: each group that
/// fabricates shared fixtures opens a non-joinable transaction, and
/// nested groups roll back in LIFO order.
pub trait ObjectStore: Send + Sync {
    /// Open a transaction. A non-joinable transaction always opens a new
    /// nested frame; a joinable one may merge into an already-open frame.
    fn begin_transaction(&self, joinable: bool) -> Result<(), StoreError>;

    /// Discard every write made since the innermost open transaction
    /// began.
    fn rollback_transaction(&self) -> Result<(), StoreError>;

    /// Create a row of the given kind, assigning the next identifier.
    fn create(&self, kind: &str, attrs: Attributes) -> Result<Record, StoreError>;

    /// Write a mutated copy back to the store.
    fn update(&self, record: &Record) -> Result<(), StoreError>;

    /// Load a fresh copy of a row.
    fn fetch(&self, kind: &str, id: ObjectId) -> Result<Record, StoreError>;

    /// Number of rows of the given kind currently visible.
    fn count(&self, kind: &str) -> usize;
}
