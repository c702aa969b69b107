//! Loosely-typed upsert input.
//!
//! Callers at the write boundary send whatever JSON they have: numbers as
//! strings, flags as `"Y"`, missing sort orders. [`RawCodeNode`] accepts any
//! JSON object and leaves interpretation to [`crate::normalize`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::CodeNode;

/// One element of an upsert batch before normalization.
///
/// Every field is an optional JSON value. Deserialization only fails if the
/// element is not a JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCodeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_yn: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<Value>,
}

impl RawCodeNode {
    /// An active root node with the given code and name.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: Some(Value::String(code.into())),
            name: Some(Value::String(name.into())),
            use_yn: Some(Value::Bool(true)),
            ..Default::default()
        }
    }

    pub fn parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(Value::String(parent_code.into()));
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(Value::from(depth));
        self
    }

    pub fn sort_order(mut self, sort_order: u32) -> Self {
        self.sort_order = Some(Value::from(sort_order));
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.use_yn = Some(Value::Bool(active));
        self
    }

    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(Value::String(remark.into()));
        self
    }
}

impl From<&CodeNode> for RawCodeNode {
    fn from(node: &CodeNode) -> Self {
        Self {
            code: Some(Value::String(node.code.clone())),
            name: Some(Value::String(node.name.clone())),
            parent_code: node.parent_code.clone().map(Value::String),
            depth: Some(Value::from(node.depth)),
            sort_order: Some(Value::from(node.sort_order)),
            use_yn: Some(Value::Bool(node.use_yn)),
            remark: node.remark.clone().map(Value::String),
        }
    }
}
