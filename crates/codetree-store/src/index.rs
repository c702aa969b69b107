//! Parent-to-children adjacency index over a slice of nodes.
//!
//! Built once per operation so subtree traversal is linear in the number of
//! nodes instead of rescanning the collection at every level.

use std::collections::{HashMap, HashSet};

use codetree_types::CodeNode;

/// Forward-edge index: parent code -> child codes, plus the roots.
#[derive(Clone, Debug, Default)]
pub struct ChildIndex<'a> {
    children: HashMap<&'a str, Vec<&'a str>>,
    roots: Vec<&'a str>,
}

impl<'a> ChildIndex<'a> {
    pub fn build(nodes: &'a [CodeNode]) -> Self {
        let mut index = Self::default();
        for node in nodes {
            match node.parent_code.as_deref() {
                Some(parent) => index.children.entry(parent).or_default().push(&node.code),
                None => index.roots.push(&node.code),
            }
        }
        index
    }

    /// Codes of the direct children of `parent`, in collection order.
    pub fn children_of(&self, parent: &str) -> &[&'a str] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Codes of all root nodes, in collection order.
    pub fn roots(&self) -> &[&'a str] {
        &self.roots
    }

    /// `root` together with every transitive descendant.
    ///
    /// Traversal order is unspecified. A visited set makes the walk
    /// terminate even if corrupted data contains a parent cycle.
    pub fn subtree<'s>(&'s self, root: &'s str) -> HashSet<&'s str> {
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for &child in self.children_of(current) {
                if !visited.contains(child) {
                    stack.push(child);
                }
            }
        }
        visited
    }
}
