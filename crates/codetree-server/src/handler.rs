//! Request handlers.
//!
//! GET    /v1/health           -- liveness
//! GET    /v1/info             -- server name and version
//! GET    /v1/code-tree        -- `code`, else `parent`, else `depth` (default 1)
//! PUT    /v1/code-tree        -- batch upsert, body `{ "codes": [...] }`
//! DELETE /v1/code-tree?code=  -- cascading delete
//! GET    /v1/code-tree/check  -- integrity report

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use codetree_store::{
    CodeTree, CollectionStore, DeleteOutcome, IntegrityReport, TreeResult, UpsertOutcome,
};
use codetree_types::{CodeNode, RawCodeNode};

use crate::error::ApiError;

/// The engine shared by all handlers.
pub type SharedTree = Arc<CodeTree<Arc<dyn CollectionStore>>>;

#[derive(Clone)]
pub struct AppState {
    pub tree: SharedTree,
}

impl AppState {
    pub fn new(tree: CodeTree<Arc<dyn CollectionStore>>) -> Self {
        Self {
            tree: Arc::new(tree),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CodeTreeQuery {
    pub code: Option<String>,
    pub parent: Option<String>,
    pub depth: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CodesResponse {
    pub codes: Vec<CodeNode>,
}

/// Positive integer depth from a query value; anything else is depth 1.
pub fn parse_depth(raw: Option<&str>) -> u32 {
    raw.and_then(|d| d.trim().parse::<u32>().ok())
        .filter(|d| *d >= 1)
        .unwrap_or(1)
}

/// Run a blocking engine call off the async executor.
async fn with_tree<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&CodeTree<Arc<dyn CollectionStore>>) -> TreeResult<T> + Send + 'static,
{
    let tree = Arc::clone(&state.tree);
    tokio::task::spawn_blocking(move || op(tree.as_ref()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "code tree task failed");
            ApiError::internal()
        })?
        .map_err(ApiError::from)
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler() -> Json<Value> {
    Json(json!({
        "name": "codetree-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn get_codes(
    State(state): State<AppState>,
    Query(query): Query<CodeTreeQuery>,
) -> Result<Response, ApiError> {
    if let Some(code) = query.code.filter(|c| !c.is_empty()) {
        let found = with_tree(&state, move |tree| tree.get_with_children(&code)).await?;
        return Ok(Json(found).into_response());
    }

    if let Some(parent) = query.parent {
        let codes = with_tree(&state, move |tree| {
            tree.list_children(Some(parent.as_str()).filter(|p| !p.is_empty()))
        })
        .await?;
        return Ok(Json(CodesResponse { codes }).into_response());
    }

    let depth = parse_depth(query.depth.as_deref());
    let codes = with_tree(&state, move |tree| tree.list_by_depth(depth)).await?;
    Ok(Json(CodesResponse { codes }).into_response())
}

pub async fn put_codes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpsertOutcome>, ApiError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;

    let entries = payload
        .get("codes")
        .and_then(Value::as_array)
        .filter(|codes| !codes.is_empty())
        .ok_or_else(|| ApiError::bad_request("codes array is required"))?;

    let batch = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let not_object = || ApiError::bad_request(format!("codes[{index}] must be an object"));
            if !entry.is_object() {
                return Err(not_object());
            }
            RawCodeNode::deserialize(entry).map_err(|_| not_object())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = with_tree(&state, move |tree| tree.upsert_codes(&batch)).await?;
    Ok(Json(outcome))
}

pub async fn delete_codes(
    State(state): State<AppState>,
    Query(query): Query<CodeTreeQuery>,
) -> Result<Response, ApiError> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("code is required"))?;

    let outcome: DeleteOutcome =
        with_tree(&state, move |tree| tree.delete_with_descendants(&code)).await?;
    if !outcome.deleted {
        let body = json!({ "error": "Code not found", "deleted": false });
        return Ok((StatusCode::NOT_FOUND, Json(body)).into_response());
    }
    Ok(Json(outcome).into_response())
}

pub async fn check_codes(State(state): State<AppState>) -> Result<Json<IntegrityReport>, ApiError> {
    let report = with_tree(&state, |tree| tree.check()).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_defaults_to_one() {
        assert_eq!(parse_depth(None), 1);
        assert_eq!(parse_depth(Some("abc")), 1);
        assert_eq!(parse_depth(Some("0")), 1);
        assert_eq!(parse_depth(Some("-2")), 1);
        assert_eq!(parse_depth(Some(" 3 ")), 3);
    }

    #[test]
    fn health_response_default() {
        let h = HealthResponse::default();
        assert_eq!(h.status, "ok");
        assert!(!h.version.is_empty());
    }
}
