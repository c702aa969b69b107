//! HTTP server for codetree.
//!
//! Exposes the code-tree engine as a small JSON API: listing by depth or
//! parent, node lookup with children, validated batch upsert, cascading
//! delete, and an integrity report.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::{AppState, SharedTree};
pub use server::CodeTreeServer;
