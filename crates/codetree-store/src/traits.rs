use std::sync::Arc;

use codetree_types::CodeCollection;

use crate::error::StorageResult;

/// Whole-collection storage port for the code forest.
///
/// All implementations must satisfy these invariants:
/// - `read` returns the last collection passed to a successful `write`, or
///   an empty collection if nothing was ever written.
/// - `write` replaces the whole collection; a reader never observes a
///   partially written collection.
/// - All I/O errors are propagated, never silently ignored.
///
/// There is no locking across a read followed by a write. Concurrent
/// writers are last-write-wins at collection granularity.
pub trait CollectionStore: Send + Sync {
    /// Read the entire persisted collection.
    fn read(&self) -> StorageResult<CodeCollection>;

    /// Replace the entire persisted collection.
    fn write(&self, collection: &CodeCollection) -> StorageResult<()>;
}

impl<S: CollectionStore + ?Sized> CollectionStore for Arc<S> {
    fn read(&self) -> StorageResult<CodeCollection> {
        (**self).read()
    }

    fn write(&self, collection: &CodeCollection) -> StorageResult<()> {
        (**self).write(collection)
    }
}

impl<S: CollectionStore + ?Sized> CollectionStore for Box<S> {
    fn read(&self) -> StorageResult<CodeCollection> {
        (**self).read()
    }

    fn write(&self, collection: &CodeCollection) -> StorageResult<()> {
        (**self).write(collection)
    }
}
