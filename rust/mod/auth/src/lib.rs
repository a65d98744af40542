//! Auth module: login, users, roles and the Permission Resolver.
//!
//! # Resources
//!
//! - **User**: community member, created on first login via the identity provider
//! - **Permission**: capability name such as `blog:write`
//! - **PermissionGroup**: named bundle of permissions
//! - **Role**: direct permissions plus attached groups; every user holds at most one
//!
//! Tokens carry a snapshot of the holder's effective permissions. Each
//! request recomputes the live set and refuses the token if they differ.
//!
//! # Usage
//!
//! ```ignore
//! use auth::{AuthModule, service::{AuthConfig, OAuthProvider}};
//!
//! let module = AuthModule::new(sql, Arc::new(OAuthProvider::new(oauth)), AuthConfig::default())?;
//! let authenticator = module.authenticator(); // hand to other modules
//! let router = module.routes();
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use devplaza_core::{Authenticator, Module, ServiceError};
use devplaza_sql::SQLStore;

use crate::service::{AuthConfig, AuthService, IdentityProvider};

/// Auth module implementing the Module trait.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create a new AuthModule.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        identity: Arc<dyn IdentityProvider>,
        config: AuthConfig,
    ) -> Result<Self, ServiceError> {
        let service = AuthService::new(sql, identity, config).map_err(ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AuthService.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }

    /// The request authenticator other modules put in front of their routes.
    pub fn authenticator(&self) -> Arc<dyn Authenticator> {
        self.service.clone()
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
