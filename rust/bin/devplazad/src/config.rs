//! Server configuration, read from a TOML file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/devplaza"
//!
//! [jwt]
//! secret = "..."
//! expire_secs = 604800
//!
//! [oauth]
//! client_id = "..."
//! client_secret = "..."
//! access_api = "https://id.example.com/oauth/access"
//! user_api = "https://id.example.com/oauth/user"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use auth::service::OAuthConfig;

/// Directory searched for bare context names.
const CONFIG_DIR: &str = "/etc/devplaza";

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `data.sqlite`.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_expire_secs")]
    pub expire_secs: i64,
}

fn default_expire_secs() -> i64 {
    604800
}

/// Server-side configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
}

impl ServerConfig {
    /// Turn a context name or path into a config file path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
