//! Bootstrap: first-start checks, storage and module wiring.
//!
//! When devplazad starts:
//! 1. Verify the config has a JWT secret and a data directory.
//! 2. Open the SQLite store and create the schemas.
//! 3. Seed the default role catalogue if no permissions exist yet.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tracing::info;

use auth::AuthModule;
use auth::service::{AuthConfig, OAuthProvider};
use devplaza_core::{Module, ServiceConfig};
use devplaza_sql::{SQLStore, SqliteStore};
use social::SocialModule;

use crate::config::ServerConfig;
use crate::routes;

/// Verify server configuration is ready for production use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.jwt.expire_secs <= 0 {
        anyhow::bail!("JWT expire_secs must be positive.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    Ok(())
}

/// Open storage, initialize every module and build the full router.
pub fn build_app(config: &ServerConfig) -> anyhow::Result<Router> {
    let data_dir = PathBuf::from(&config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = ServiceConfig {
        data_dir: Some(data_dir),
        ..Default::default()
    };
    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let auth_config = AuthConfig {
        jwt_secret: config.jwt.secret.clone(),
        token_ttl: config.jwt.expire_secs,
        ..Default::default()
    };
    let auth_module = AuthModule::new(
        Arc::clone(&sql),
        Arc::new(OAuthProvider::new(config.oauth.clone())),
        auth_config,
    )?;
    if auth_module.service().seed_catalogue()? {
        info!("Seeded default roles and permissions");
    }
    info!("Auth module initialized");

    let social_module = SocialModule::new(Arc::clone(&sql), auth_module.authenticator())?;
    info!("Social module initialized");

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (social_module.name(), social_module.routes()),
    ];
    Ok(routes::build_router(module_routes))
}
