//! Batch normalization: loose [`RawCodeNode`] input to typed [`CodeNode`]s.
//!
//! Rules applied to every element:
//! - `code` and `parentCode` are trimmed and upper-cased; a blank parent is a root
//! - `name` is trimmed
//! - `depth` becomes a positive integer, default 1
//! - `sortOrder` becomes a positive integer, default the 1-based batch position
//! - `useYn` becomes a boolean
//! - `updatedAt` is one timestamp shared by the whole batch
//!
//! Checks that need the persisted forest (parent existence, depth
//! consistency) live in the store crate.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::ValidationError;
use crate::node::CodeNode;
use crate::raw::RawCodeNode;

/// Canonical form of a code: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Normalize a whole batch and reject empty batches and duplicate codes.
pub fn normalize_batch(
    raw: &[RawCodeNode],
    now: DateTime<Utc>,
) -> Result<Vec<CodeNode>, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    let nodes = raw
        .iter()
        .enumerate()
        .map(|(index, r)| normalize_node(r, index, now))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::with_capacity(nodes.len());
    for node in &nodes {
        if !seen.insert(node.code.as_str()) {
            return Err(ValidationError::DuplicateCode(node.code.clone()));
        }
    }

    Ok(nodes)
}

/// Normalize one element sitting at `index` (0-based) in its batch.
pub fn normalize_node(
    raw: &RawCodeNode,
    index: usize,
    now: DateTime<Utc>,
) -> Result<CodeNode, ValidationError> {
    let code = text(raw.code.as_ref())
        .map(|c| normalize_code(&c))
        .filter(|c| !c.is_empty())
        .ok_or(ValidationError::MissingField { index, field: "code" })?;

    let name = text(raw.name.as_ref())
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(ValidationError::MissingField { index, field: "name" })?;

    let parent_code = text(raw.parent_code.as_ref())
        .map(|p| normalize_code(&p))
        .filter(|p| !p.is_empty());

    let position = u32::try_from(index + 1).unwrap_or(u32::MAX);

    Ok(CodeNode {
        code,
        name,
        parent_code,
        depth: positive_int(raw.depth.as_ref()).unwrap_or(1),
        sort_order: positive_int(raw.sort_order.as_ref()).unwrap_or(position),
        use_yn: flag(raw.use_yn.as_ref()),
        remark: text(raw.remark.as_ref()),
        updated_at: Some(now),
    })
}

/// Strings pass through, numbers are rendered; anything else is absent.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whole numbers `>= 1` from JSON numbers or numeric strings.
fn positive_int(value: Option<&Value>) -> Option<u32> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() && n.fract() == 0.0 && n >= 1.0 && n <= f64::from(u32::MAX) {
        Some(n as u32)
    } else {
        None
    }
}

/// Truthiness with the usual `Y`/`N` spellings treated as flags.
fn flag(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !matches!(
            s.trim().to_uppercase().as_str(),
            "" | "N" | "NO" | "FALSE" | "0" | "OFF"
        ),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
