//! The code-tree engine: reads, validated batch upsert, and cascading delete.
//!
//! Every operation reads the whole collection from the [`CollectionStore`].
//! Writes validate the batch against the collection first and only then
//! apply it and replace the collection with a single `write` call.
//!
//! # Invariants
//!
//! - `code` is unique across the whole forest.
//! - Every parent reference resolves to a stored node or a node in the same batch.
//! - With depth enforcement on, roots sit at depth 1 and children one below
//!   their parent.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use codetree_types::{
    normalize_batch, normalize_code, sort_nodes, CodeCollection, CodeNode, RawCodeNode,
    ValidationError,
};

use crate::check::{ForestChecker, IntegrityReport};
use crate::error::{TreeError, TreeResult};
use crate::index::ChildIndex;
use crate::traits::CollectionStore;

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Reject upserts whose depth disagrees with the parent's depth, and
    /// nodes that name themselves as parent. Turn off to store legacy
    /// caller-supplied depths unchanged.
    pub enforce_depth: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { enforce_depth: true }
    }
}

/// A node and its direct children in display order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeWithChildren {
    pub node: CodeNode,
    pub children: Vec<CodeNode>,
}

/// The normalized batch as it was saved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub saved: Vec<CodeNode>,
}

/// Result of a cascading delete. `count` is present only when something
/// was removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl DeleteOutcome {
    fn nothing() -> Self {
        Self {
            deleted: false,
            count: None,
        }
    }

    fn removed(count: usize) -> Self {
        Self {
            deleted: true,
            count: Some(count),
        }
    }
}

/// The forest of code nodes over a storage backend.
pub struct CodeTree<S> {
    store: S,
    config: TreeConfig,
}

impl<S: CollectionStore> CodeTree<S> {
    /// Engine with the default configuration (depth enforced).
    pub fn new(store: S) -> Self {
        Self::with_config(store, TreeConfig::default())
    }

    pub fn with_config(store: S, config: TreeConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// All nodes at `depth`, ordered by `(sort_order, code)`.
    pub fn list_by_depth(&self, depth: u32) -> TreeResult<Vec<CodeNode>> {
        let collection = self.store.read()?;
        let mut nodes: Vec<CodeNode> = collection
            .codes
            .into_iter()
            .filter(|n| n.depth == depth)
            .collect();
        sort_nodes(&mut nodes);
        debug!(depth, count = nodes.len(), "listed codes by depth");
        Ok(nodes)
    }

    /// All nodes whose parent is exactly `parent`; `None` lists the roots.
    pub fn list_children(&self, parent: Option<&str>) -> TreeResult<Vec<CodeNode>> {
        let collection = self.store.read()?;
        let children = children_of(&collection, parent);
        debug!(parent = ?parent, count = children.len(), "listed child codes");
        Ok(children)
    }

    /// The node with exactly `code` and its direct children.
    pub fn get_with_children(&self, code: &str) -> TreeResult<NodeWithChildren> {
        let collection = self.store.read()?;
        let node = collection
            .get(code)
            .cloned()
            .ok_or_else(|| TreeError::NotFound {
                code: code.to_string(),
            })?;
        let children = children_of(&collection, Some(code));
        Ok(NodeWithChildren { node, children })
    }

    /// Integrity scan of the persisted forest.
    pub fn check(&self) -> TreeResult<IntegrityReport> {
        let collection = self.store.read()?;
        let report = ForestChecker::check(&collection);
        if !report.is_valid() {
            warn!(violations = report.violations.len(), "code forest has integrity violations");
        }
        Ok(report)
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Validated create-or-replace of a batch, stamped with the current time.
    pub fn upsert_codes(&self, raw: &[RawCodeNode]) -> TreeResult<UpsertOutcome> {
        self.upsert_codes_at(raw, Utc::now())
    }

    /// [`upsert_codes`](Self::upsert_codes) with an explicit `updatedAt` stamp.
    ///
    /// Nothing is written unless the whole batch validates. Existing nodes
    /// are fully replaced in place; new nodes are appended.
    pub fn upsert_codes_at(
        &self,
        raw: &[RawCodeNode],
        now: DateTime<Utc>,
    ) -> TreeResult<UpsertOutcome> {
        let batch = normalize_batch(raw, now).inspect_err(|e| {
            warn!(error = %e, "rejected code batch");
        })?;

        let mut collection = self.store.read()?;
        self.validate_placement(&batch, &collection).inspect_err(|e| {
            warn!(error = %e, "rejected code batch");
        })?;

        let mut replaced = 0usize;
        for node in &batch {
            if collection.upsert(node.clone()) {
                replaced += 1;
            }
        }
        self.store.write(&collection)?;

        info!(
            saved = batch.len(),
            replaced,
            total = collection.len(),
            "upserted code batch"
        );
        Ok(UpsertOutcome { saved: batch })
    }

    /// Remove `code` and its whole subtree.
    ///
    /// `code` is trimmed and upper-cased first. A code that does not exist
    /// yields `deleted: false` and nothing is written.
    pub fn delete_with_descendants(&self, code: &str) -> TreeResult<DeleteOutcome> {
        let target = normalize_code(code);
        let mut collection = self.store.read()?;
        if !collection.contains(&target) {
            debug!(code = %target, "delete target not found");
            return Ok(DeleteOutcome::nothing());
        }

        let doomed: HashSet<String> = {
            let index = ChildIndex::build(&collection.codes);
            index
                .subtree(&target)
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        let before = collection.len();
        collection.codes.retain(|n| !doomed.contains(&n.code));
        let count = before - collection.len();

        self.store.write(&collection)?;
        info!(code = %target, count, "deleted code subtree");
        Ok(DeleteOutcome::removed(count))
    }

    /// Parent and depth checks that need the persisted forest.
    ///
    /// Parents are resolved in the batch first, so a batch can create a
    /// parent together with its children. With depth enforcement on, the
    /// forest as it would look after the batch must stay acyclic, and stored
    /// children of a node whose depth changes must be moved in the same batch.
    fn validate_placement(
        &self,
        batch: &[CodeNode],
        existing: &CodeCollection,
    ) -> Result<(), ValidationError> {
        let in_batch: HashMap<&str, &CodeNode> =
            batch.iter().map(|n| (n.code.as_str(), n)).collect();
        let parent_depth = |parent: &str| {
            in_batch
                .get(parent)
                .map(|p| p.depth)
                .or_else(|| existing.get(parent).map(|p| p.depth))
        };

        for node in batch {
            if let Some(parent) = node.parent_code.as_deref() {
                if parent_depth(parent).is_none() {
                    return Err(ValidationError::ParentNotFound(parent.to_string()));
                }
            }
        }

        if !self.config.enforce_depth {
            return Ok(());
        }

        for node in batch {
            check_ancestry(node, &in_batch, existing)?;
        }

        for node in batch {
            let expected = node
                .parent_code
                .as_deref()
                .and_then(parent_depth)
                .map_or(1, |d| d.saturating_add(1));
            if node.depth != expected {
                return Err(ValidationError::DepthMismatch {
                    code: node.code.clone(),
                    expected,
                    actual: node.depth,
                });
            }
        }

        let index = ChildIndex::build(&existing.codes);
        for node in batch {
            let unchanged = existing
                .get(&node.code)
                .is_some_and(|old| old.depth == node.depth);
            if unchanged {
                continue;
            }
            let expected = node.depth.saturating_add(1);
            for &child in index.children_of(&node.code) {
                if in_batch.contains_key(child) {
                    continue;
                }
                if let Some(stored) = existing.get(child).filter(|c| c.depth != expected) {
                    return Err(ValidationError::DepthMismatch {
                        code: stored.code.clone(),
                        expected,
                        actual: stored.depth,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Walk `node`'s ancestors in the post-batch forest and fail if `node`
/// is among them.
fn check_ancestry(
    node: &CodeNode,
    in_batch: &HashMap<&str, &CodeNode>,
    existing: &CodeCollection,
) -> Result<(), ValidationError> {
    if node.parent_code.as_deref() == Some(node.code.as_str()) {
        return Err(ValidationError::SelfParent(node.code.clone()));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = node.parent_code.as_deref();
    while let Some(code) = current {
        if code == node.code {
            return Err(ValidationError::ParentCycle(node.code.clone()));
        }
        // An older cycle that does not pass through `node`.
        if !seen.insert(code) {
            break;
        }
        current = match in_batch.get(code) {
            Some(n) => n.parent_code.as_deref(),
            None => existing.get(code).and_then(|n| n.parent_code.as_deref()),
        };
    }
    Ok(())
}

/// Direct children of `parent` in display order.
fn children_of(collection: &CodeCollection, parent: Option<&str>) -> Vec<CodeNode> {
    let mut children: Vec<CodeNode> = collection
        .codes
        .iter()
        .filter(|n| n.has_parent(parent))
        .cloned()
        .collect();
    sort_nodes(&mut children);
    children
}

impl<S> std::fmt::Debug for CodeTree<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeTree")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
