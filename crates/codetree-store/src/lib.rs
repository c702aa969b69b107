//! Code-tree storage for codetree.
//!
//! This crate owns the forest of classification codes. The [`CodeTree`]
//! engine reads the whole collection through a [`CollectionStore`], computes
//! a result, and for writes replaces the whole collection in one call.
//!
//! # Storage Backends
//!
//! All backends implement the [`CollectionStore`] trait:
//!
//! - [`JsonFileStore`] -- pretty-printed JSON document, atomically replaced
//! - [`InMemoryCollectionStore`] -- `RwLock`-guarded store for tests and embedding
//!
//! # Design Rules
//!
//! 1. `code` is unique across the whole forest.
//! 2. Every parent reference resolves, either in the store or in the same batch.
//! 3. Validation completes before any mutation is applied.
//! 4. Deleting a node deletes its whole subtree.
//! 5. Reads never write; every successful write replaces the whole collection.
//! 6. All I/O errors are propagated, never silently ignored.

pub mod check;
pub mod error;
pub mod file;
pub mod index;
pub mod memory;
pub mod traits;
pub mod tree;

pub use check::{ForestChecker, IntegrityReport, Violation, ViolationKind};
pub use error::{StorageError, StorageResult, TreeError, TreeResult};
pub use file::JsonFileStore;
pub use index::ChildIndex;
pub use memory::InMemoryCollectionStore;
pub use traits::CollectionStore;
pub use tree::{CodeTree, DeleteOutcome, NodeWithChildren, TreeConfig, UpsertOutcome};
