use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use codetree_types::{CodeCollection, CodeNode};

use crate::error::StorageResult;
use crate::traits::CollectionStore;

/// In-memory collection store.
///
/// Intended for tests and embedding. The collection is held behind a
/// `RwLock` and cloned on read/write. Successful writes are counted so
/// callers can assert that an operation did or did not persist.
pub struct InMemoryCollectionStore {
    collection: RwLock<CodeCollection>,
    writes: AtomicU64,
}

impl InMemoryCollectionStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_codes(Vec::new())
    }

    /// Create a store pre-populated with `codes`, bypassing validation.
    pub fn with_codes(codes: Vec<CodeNode>) -> Self {
        Self {
            collection: RwLock::new(CodeCollection::new(codes)),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of nodes currently stored.
    pub fn len(&self) -> usize {
        self.collection.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.collection.read().expect("lock poisoned").is_empty()
    }

    /// Number of successful `write` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Sorted list of all stored codes.
    pub fn all_codes(&self) -> Vec<String> {
        let collection = self.collection.read().expect("lock poisoned");
        let mut codes: Vec<String> = collection.codes.iter().map(|n| n.code.clone()).collect();
        codes.sort();
        codes
    }
}

impl Default for InMemoryCollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStore for InMemoryCollectionStore {
    fn read(&self) -> StorageResult<CodeCollection> {
        Ok(self.collection.read().expect("lock poisoned").clone())
    }

    fn write(&self, collection: &CodeCollection) -> StorageResult<()> {
        *self.collection.write().expect("lock poisoned") = collection.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryCollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCollectionStore")
            .field("node_count", &self.len())
            .field("write_count", &self.write_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(code: &str) -> CodeNode {
        CodeNode {
            code: code.into(),
            name: code.to_lowercase(),
            parent_code: None,
            depth: 1,
            sort_order: 1,
            use_yn: true,
            remark: None,
            updated_at: None,
        }
    }

    #[test]
    fn new_store_reads_empty_collection() {
        let store = InMemoryCollectionStore::new();
        assert!(store.read().unwrap().is_empty());
        assert!(store.is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn write_replaces_whole_collection() {
        let store = InMemoryCollectionStore::with_codes(vec![node("A"), node("B")]);
        store.write(&CodeCollection::new(vec![node("C")])).unwrap();
        assert_eq!(store.all_codes(), vec!["C".to_string()]);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn read_returns_a_detached_copy() {
        let store = InMemoryCollectionStore::with_codes(vec![node("A")]);
        let mut copy = store.read().unwrap();
        copy.codes.clear();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryCollectionStore::with_codes(vec![node("A"), node("B")]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    assert_eq!(store.read().unwrap().len(), 2);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryCollectionStore::with_codes(vec![node("X")]);
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryCollectionStore"));
        assert!(debug.contains("node_count"));
    }
}
