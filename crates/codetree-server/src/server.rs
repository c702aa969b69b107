use std::sync::Arc;

use codetree_store::{CodeTree, CollectionStore, JsonFileStore};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Code-tree HTTP server.
pub struct CodeTreeServer {
    config: ServerConfig,
    state: AppState,
}

impl CodeTreeServer {
    /// Server over the JSON document at `config.data_path`.
    pub fn new(config: ServerConfig) -> Self {
        let store: Arc<dyn CollectionStore> = Arc::new(JsonFileStore::new(&config.data_path));
        Self::with_store(config, store)
    }

    /// Server over an arbitrary storage backend.
    pub fn with_store(config: ServerConfig, store: Arc<dyn CollectionStore>) -> Self {
        let tree = CodeTree::with_config(store, config.tree_config());
        Self {
            state: AppState::new(tree),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = build_router(self.state);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            data = %self.config.data_path.display(),
            enforce_depth = self.config.enforce_depth,
            "codetree server listening on {}",
            self.config.bind_addr
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
