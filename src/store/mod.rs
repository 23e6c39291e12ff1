//! Entity store abstraction for style records.
//!
//! The real persistence engine is an external collaborator; the core only
//! relies on this trait pair: reads plus a scoped transaction that commits
//! or rolls back on every exit path. Conflict detection uses per-record
//! versions — an update carrying a stale version fails with
//! [`Error::Conflict`] instead of silently overwriting, which is how the
//! store's row-level isolation surfaces in this core.
//!
//! [`MemoryStyleStore`] is the in-process implementation used by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::debug;

use crate::error::Error;
use crate::style::{StyleId, StyleRecord};

/// A style record together with its store version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub version: u64,
    pub record: StyleRecord,
}

/// Read and transaction entry points into the entity store.
pub trait StyleStore: Send + Sync {
    /// Fetches a record and its current version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the id does not exist.
    fn get(&self, id: StyleId) -> Result<Versioned, Error>;

    /// Opens a scoped transaction. Dropping the guard without calling
    /// `commit` rolls back every buffered write.
    fn begin(&self) -> Box<dyn StoreTransaction + '_>;
}

/// Buffered writes applied atomically on commit.
pub trait StoreTransaction {
    /// Stages an insert and returns the id the record will get.
    ///
    /// Ids are reserved immediately and never reused, even if the
    /// transaction rolls back.
    fn insert(&mut self, record: StyleRecord) -> Result<StyleId, Error>;

    /// Stages an update; `expected_version` is checked at commit time.
    fn update(&mut self, record: StyleRecord, expected_version: u64) -> Result<(), Error>;

    /// Stages a delete.
    fn delete(&mut self, id: StyleId) -> Result<(), Error>;

    /// Validates and applies all staged writes. All-or-nothing: any
    /// failure leaves the store untouched.
    fn commit(self: Box<Self>) -> Result<(), Error>;
}

#[derive(Debug)]
enum Op {
    Insert(StyleRecord),
    Update {
        expected_version: u64,
        record: StyleRecord,
    },
    Delete(StyleId),
}

/// In-memory style store with the same transactional contract as a real
/// backend.
#[derive(Debug)]
pub struct MemoryStyleStore {
    next_id: AtomicU64,
    rows: RwLock<HashMap<StyleId, Versioned>>,
}

impl Default for MemoryStyleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStyleStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            rows: RwLock::default(),
        }
    }

    /// Number of persisted records, for test assertions.
    pub fn len(&self) -> usize {
        self.rows.read().expect("style store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StyleStore for MemoryStyleStore {
    fn get(&self, id: StyleId) -> Result<Versioned, Error> {
        self.rows
            .read()
            .expect("style store lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound { what: "style", id })
    }

    fn begin(&self) -> Box<dyn StoreTransaction + '_> {
        Box::new(MemoryTransaction {
            store: self,
            ops: Vec::new(),
            committed: false,
        })
    }
}

struct MemoryTransaction<'a> {
    store: &'a MemoryStyleStore,
    ops: Vec<Op>,
    committed: bool,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn insert(&mut self, mut record: StyleRecord) -> Result<StyleId, Error> {
        let id = self.store.next_id.fetch_add(1, Ordering::Relaxed);
        record.id = id;
        self.ops.push(Op::Insert(record));
        Ok(id)
    }

    fn update(&mut self, record: StyleRecord, expected_version: u64) -> Result<(), Error> {
        self.ops.push(Op::Update {
            expected_version,
            record,
        });
        Ok(())
    }

    fn delete(&mut self, id: StyleId) -> Result<(), Error> {
        self.ops.push(Op::Delete(id));
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), Error> {
        let mut rows = self.store.rows.write().expect("style store lock poisoned");

        // Validate every staged op before touching anything
        for op in &self.ops {
            match op {
                Op::Insert(_) => {}
                Op::Update {
                    expected_version,
                    record,
                } => {
                    let current = rows.get(&record.id).ok_or(Error::NotFound {
                        what: "style",
                        id: record.id,
                    })?;
                    if current.version != *expected_version {
                        return Err(Error::Conflict {
                            style_id: record.id,
                            expected: *expected_version,
                            found: current.version,
                        });
                    }
                }
                Op::Delete(id) => {
                    if !rows.contains_key(id) {
                        return Err(Error::NotFound { what: "style", id: *id });
                    }
                }
            }
        }

        let op_count = self.ops.len();
        for op in self.ops.drain(..) {
            match op {
                Op::Insert(record) => {
                    rows.insert(record.id, Versioned { version: 1, record });
                }
                Op::Update { record, .. } => {
                    let version = rows.get(&record.id).map(|v| v.version).unwrap_or(0) + 1;
                    rows.insert(record.id, Versioned { version, record });
                }
                Op::Delete(id) => {
                    rows.remove(&id);
                }
            }
        }

        self.committed = true;
        debug!(ops = op_count, "store transaction committed");
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.ops.is_empty() {
            debug!(ops = self.ops.len(), "store transaction rolled back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> StyleRecord {
        StyleRecord {
            id: 0,
            layer_id: 7,
            display_name: name.to_string(),
            type_tag: "raster".to_string(),
            data: json!({}),
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = MemoryStyleStore::new();
        let mut txn = store.begin();
        let a = txn.insert(record("a")).unwrap();
        let b = txn.insert(record("b")).unwrap();
        txn.commit().unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.get(a).unwrap().record.display_name, "a");
        assert_eq!(store.get(a).unwrap().version, 1);
    }

    #[test]
    fn test_ids_not_reused_after_rollback() {
        let store = MemoryStyleStore::new();
        {
            let mut txn = store.begin();
            assert_eq!(txn.insert(record("dropped")).unwrap(), 1);
            // No commit: transaction rolls back on drop
        }
        assert!(store.is_empty());

        let mut txn = store.begin();
        let id = txn.insert(record("kept")).unwrap();
        txn.commit().unwrap();
        assert_eq!(id, 2, "rolled-back id must not be reused");
    }

    #[test]
    fn test_update_bumps_version() {
        let store = MemoryStyleStore::new();
        let mut txn = store.begin();
        let id = txn.insert(record("a")).unwrap();
        txn.commit().unwrap();

        let loaded = store.get(id).unwrap();
        let mut updated = loaded.record.clone();
        updated.display_name = "b".to_string();

        let mut txn = store.begin();
        txn.update(updated, loaded.version).unwrap();
        txn.commit().unwrap();

        let after = store.get(id).unwrap();
        assert_eq!(after.version, 2);
        assert_eq!(after.record.display_name, "b");
    }

    #[test]
    fn test_stale_version_conflicts() {
        let store = MemoryStyleStore::new();
        let mut txn = store.begin();
        let id = txn.insert(record("a")).unwrap();
        txn.commit().unwrap();

        let loaded = store.get(id).unwrap();

        // First writer wins
        let mut txn = store.begin();
        txn.update(loaded.record.clone(), loaded.version).unwrap();
        txn.commit().unwrap();

        // Second writer carries the stale version
        let mut txn = store.begin();
        txn.update(loaded.record.clone(), loaded.version).unwrap();
        let err = txn.commit().unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict { style_id, expected: 1, found: 2 } if style_id == id
        ));
    }

    #[test]
    fn test_failed_commit_applies_nothing() {
        let store = MemoryStyleStore::new();
        let mut txn = store.begin();
        let id = txn.insert(record("a")).unwrap();
        txn.commit().unwrap();

        // Mix a valid insert with an update that must conflict
        let mut txn = store.begin();
        txn.insert(record("new")).unwrap();
        txn.update(store.get(id).unwrap().record, 99).unwrap();
        assert!(txn.commit().is_err());

        assert_eq!(store.len(), 1, "no partial write on failed commit");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = MemoryStyleStore::new();
        let mut txn = store.begin();
        txn.delete(404).unwrap();
        let err = txn.commit().unwrap_err();
        assert!(matches!(err, Error::NotFound { what: "style", id: 404 }));
    }

    #[test]
    fn test_delete_removes_record() {
        let store = MemoryStyleStore::new();
        let mut txn = store.begin();
        let id = txn.insert(record("a")).unwrap();
        txn.commit().unwrap();

        let mut txn = store.begin();
        txn.delete(id).unwrap();
        txn.commit().unwrap();

        assert!(matches!(
            store.get(id).unwrap_err(),
            Error::NotFound { what: "style", .. }
        ));
    }
}
