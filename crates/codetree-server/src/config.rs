use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use codetree_store::TreeConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server settings. Every field has a default, so a TOML file only needs
/// the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_path: PathBuf,
    pub enforce_depth: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8086)),
            data_path: PathBuf::from("data/code-tree.json"),
            enforce_depth: true,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            enforce_depth: self.enforce_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8086".parse::<SocketAddr>().unwrap());
        assert_eq!(c.data_path, PathBuf::from("data/code-tree.json"));
        assert!(c.enforce_depth);
        assert!(c.tree_config().enforce_depth);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml_str("bind_addr = \"0.0.0.0:9000\"\nenforce_depth = false\n")
            .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert!(!c.enforce_depth);
        assert_eq!(c.data_path, PathBuf::from("data/code-tree.json"));
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = ServerConfig::from_toml_str("bind_addr = 12").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codetree.toml");
        std::fs::write(&path, "data_path = \"/srv/codes.json\"\n").unwrap();
        let c = ServerConfig::from_toml_file(&path).unwrap();
        assert_eq!(c.data_path, PathBuf::from("/srv/codes.json"));
    }
}
