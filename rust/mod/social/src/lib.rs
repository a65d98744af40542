//! Social module: posts, reactions, follows, the feed and post statistics.
//!
//! # Components
//!
//! - **Counter Store**: like/favorite rows per (post, user) and the
//!   denormalized counters on each post, updated in one transaction
//! - **Follow Graph**: directed follower/following edges
//! - **Feed Composer**: single ranked listing, or a hybrid blend of
//!   followed authors and everyone else for signed-in viewers
//! - **Status Aggregator**: the viewer's flags over a batch of posts
//!
//! The module never talks to the auth module directly. Routes are guarded by
//! the [`Authenticator`] handed in at construction.
//!
//! # Usage
//!
//! ```ignore
//! let social = SocialModule::new(sql, auth_module.authenticator())?;
//! let router = social.routes();
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use devplaza_core::{Authenticator, Module, ServiceError};
use devplaza_sql::SQLStore;

use crate::service::SocialService;

/// Social module implementing the Module trait.
pub struct SocialModule {
    service: Arc<SocialService>,
    auth: Arc<dyn Authenticator>,
}

impl SocialModule {
    /// Create a new SocialModule. The `users` table must already exist.
    pub fn new(sql: Arc<dyn SQLStore>, auth: Arc<dyn Authenticator>) -> Result<Self, ServiceError> {
        let service = SocialService::new(sql).map_err(ServiceError::from)?;
        Ok(Self { service, auth })
    }

    pub fn service(&self) -> &Arc<SocialService> {
        &self.service
    }
}

impl Module for SocialModule {
    fn name(&self) -> &str {
        "social"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone(), self.auth.clone())
    }
}
