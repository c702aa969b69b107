//! The persisted code node and the collection document that holds the forest.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_depth() -> u32 {
    1
}

/// A single entry in the hierarchical classification forest.
///
/// `code` is upper-cased and globally unique. A node with no `parent_code`
/// is a root. Field names serialize in camelCase to match the persisted
/// document and the HTTP boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeNode {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent_code: Option<String>,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default)]
    pub sort_order: u32,
    #[serde(default)]
    pub use_yn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CodeNode {
    /// Returns `true` if the node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_code.is_none()
    }

    /// Returns `true` if `parent` is this node's parent code.
    ///
    /// `None` matches roots.
    pub fn has_parent(&self, parent: Option<&str>) -> bool {
        self.parent_code.as_deref() == parent
    }

    /// Sibling display order: `sort_order` ascending, then `code`.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.sort_order
            .cmp(&other.sort_order)
            .then_with(|| self.code.cmp(&other.code))
    }
}

/// Sort nodes into display order in place.
pub fn sort_nodes(nodes: &mut [CodeNode]) {
    nodes.sort_by(CodeNode::display_cmp);
}

/// The whole persisted forest, stored as `{ "codes": [...] }`.
///
/// Insertion order is preserved; display order is applied by readers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCollection {
    #[serde(default)]
    pub codes: Vec<CodeNode>,
}

impl CodeCollection {
    pub fn new(codes: Vec<CodeNode>) -> Self {
        Self { codes }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Look up a node by exact code.
    pub fn get(&self, code: &str) -> Option<&CodeNode> {
        self.codes.iter().find(|n| n.code == code)
    }

    /// Position of the node with `code`, if any.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.codes.iter().position(|n| n.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Replace the node with the same code in place, or append it.
    ///
    /// Returns `true` if an existing node was replaced.
    pub fn upsert(&mut self, node: CodeNode) -> bool {
        match self.position(&node.code) {
            Some(idx) => {
                self.codes[idx] = node;
                true
            }
            None => {
                self.codes.push(node);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(code: &str, sort_order: u32) -> CodeNode {
        CodeNode {
            code: code.into(),
            name: format!("{code} name"),
            parent_code: None,
            depth: 1,
            sort_order,
            use_yn: true,
            remark: None,
            updated_at: None,
        }
    }

    #[test]
    fn serializes_camel_case_and_skips_empty_remark() {
        let json = serde_json::to_value(node("ACC", 1)).unwrap();
        assert_eq!(json["code"], "ACC");
        assert_eq!(json["parentCode"], serde_json::Value::Null);
        assert_eq!(json["sortOrder"], 1);
        assert_eq!(json["useYn"], true);
        assert!(json.get("remark").is_none());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn deserializes_legacy_record_without_optional_fields() {
        let n: CodeNode = serde_json::from_str(r#"{"code":"A","name":"Alpha"}"#).unwrap();
        assert_eq!(n.depth, 1);
        assert_eq!(n.sort_order, 0);
        assert!(!n.use_yn);
        assert!(n.is_root());
    }

    #[test]
    fn collection_without_codes_key_is_empty() {
        let c: CodeCollection = serde_json::from_str("{}").unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn display_order_breaks_ties_by_code() {
        let mut nodes = vec![node("B", 2), node("C", 1), node("A", 2)];
        sort_nodes(&mut nodes);
        let codes: Vec<_> = nodes.iter().map(|n| n.code.as_str()).collect();
        assert_eq!(codes, vec!["C", "A", "B"]);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut c = CodeCollection::new(vec![node("A", 1), node("B", 2)]);
        let mut replacement = node("A", 9);
        replacement.name = "renamed".into();
        assert!(c.upsert(replacement));
        assert_eq!(c.codes[0].name, "renamed");
        assert!(!c.upsert(node("C", 3)));
        assert_eq!(c.len(), 3);
        assert_eq!(c.position("C"), Some(2));
    }

    #[test]
    fn has_parent_matches_roots_with_none() {
        let mut child = node("K", 1);
        child.parent_code = Some("P".into());
        assert!(child.has_parent(Some("P")));
        assert!(!child.has_parent(None));
        assert!(node("P", 1).has_parent(None));
    }
}
