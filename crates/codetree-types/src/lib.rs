//! Foundation types for codetree.
//!
//! This crate provides the data model shared by every other codetree crate:
//! the persisted [`CodeNode`] record, the [`CodeCollection`] document that
//! holds the whole forest, and the loosely-typed [`RawCodeNode`] accepted at
//! the write boundary together with the normalization rules that turn a raw
//! batch into typed nodes.
//!
//! # Key Types
//!
//! - [`CodeNode`] -- One entry in the classification forest
//! - [`CodeCollection`] -- The persisted `{ "codes": [...] }` document
//! - [`RawCodeNode`] -- Untyped upsert input, every field optional
//! - [`ValidationError`] -- Structured rejection of a write batch

pub mod error;
pub mod node;
pub mod normalize;
pub mod raw;

pub use error::ValidationError;
pub use node::{sort_nodes, CodeCollection, CodeNode};
pub use normalize::{normalize_batch, normalize_code, normalize_node};
pub use raw::RawCodeNode;
