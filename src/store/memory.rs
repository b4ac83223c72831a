//! In-memory transactional store.
//!
//! Kept deliberately close to the trait surface the lifecycle needs:
//! nested transactions are snapshots on a stack, rollback restores the
//! innermost snapshot. Good enough to stand in for a real engine in
//! tests and demos.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{Attributes, ObjectId, ObjectStore, Record, StoreError};

/// In-memory implementation of [`ObjectStore`].
///
/// # Example
///
/// ```rust
/// use prefab::store::{Attributes, MemoryStore, ObjectStore};
///
/// let store = MemoryStore::new();
/// store.begin_transaction(false).unwrap();
/// let row = store.create("thing", Attributes::new()).unwrap();
/// assert_eq!(store.count("thing"), 1);
/// store.rollback_transaction().unwrap();
/// assert_eq!(store.count("thing"), 0);
/// assert!(store.fetch("thing", row.id()).is_err());
/// ```
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    rows: BTreeMap<(String, ObjectId), Attributes>,
    next_id: ObjectId,
    frames: Vec<Frame>,
}

/// Snapshot taken when a transaction frame opens.
struct Frame {
    rows: BTreeMap<(String, ObjectId), Attributes>,
    next_id: ObjectId,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Depth of the open transaction stack.
    pub fn open_transactions(&self) -> usize {
        self.inner.read().frames.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    fn begin_transaction(&self, joinable: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if joinable && !inner.frames.is_empty() {
            // Joins the enclosing frame; its rollback discards our writes.
            return Ok(());
        }
        let frame = Frame {
            rows: inner.rows.clone(),
            next_id: inner.next_id,
        };
        inner.frames.push(frame);
        log::debug!(
            "memory store: transaction opened (depth {})",
            inner.frames.len()
        );
        Ok(())
    }

    fn rollback_transaction(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let frame = inner.frames.pop().ok_or(StoreError::NoTransaction)?;
        inner.rows = frame.rows;
        inner.next_id = frame.next_id;
        log::debug!(
            "memory store: transaction rolled back (depth {})",
            inner.frames.len()
        );
        Ok(())
    }

    fn create(&self, kind: &str, attrs: Attributes) -> Result<Record, StoreError> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.insert((kind.to_string(), id), attrs.clone());
        Ok(Record::new(kind, id, attrs))
    }

    fn update(&self, record: &Record) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let key = (record.kind().to_string(), record.id());
        if !inner.rows.contains_key(&key) {
            return Err(StoreError::NotFound {
                kind: record.kind().to_string(),
                id: record.id(),
            });
        }
        inner.rows.insert(key, record.attrs().clone());
        Ok(())
    }

    fn fetch(&self, kind: &str, id: ObjectId) -> Result<Record, StoreError> {
        let inner = self.inner.read();
        let attrs = inner
            .rows
            .get(&(kind.to_string(), id))
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                id,
            })?;
        Ok(Record::new(kind, id, attrs.clone()))
    }

    fn count(&self, kind: &str) -> usize {
        let inner = self.inner.read();
        inner.rows.keys().filter(|(k, _)| k == kind).count()
    }
}
