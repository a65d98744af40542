pub mod counter;
pub mod feed;
pub mod follow;
pub mod post;
pub mod schema;
pub mod stats;
pub mod status;

use std::sync::Arc;

use thiserror::Error;

use devplaza_sql::{SQLError, SQLStore};

pub use counter::Reaction;
pub use feed::blend;

/// Social service error type.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Already liked, favorited or following; or a self-follow.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    /// Acting on another author's content.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SQLError> for SocialError {
    fn from(e: SQLError) -> Self {
        match e {
            SQLError::Constraint(m) => SocialError::Conflict(m),
            // A post or user referenced by the write does not exist.
            SQLError::ForeignKey(_) => SocialError::NotFound("referenced post or user".into()),
            other => {
                tracing::error!("storage failure: {}", other);
                SocialError::Storage(other.to_string())
            }
        }
    }
}

impl From<SocialError> for devplaza_core::ServiceError {
    fn from(e: SocialError) -> Self {
        use devplaza_core::ServiceError;
        match e {
            SocialError::NotFound(m) => ServiceError::NotFound(m),
            SocialError::Conflict(m) => ServiceError::Conflict(m),
            SocialError::Validation(m) => ServiceError::Validation(m),
            SocialError::Forbidden(m) => ServiceError::PermissionDenied(m),
            SocialError::Storage(m) => ServiceError::Storage(m),
            SocialError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

/// The Social service: posts, reactions, follows and the feed.
pub struct SocialService {
    pub(crate) sql: Arc<dyn SQLStore>,
}

impl SocialService {
    /// Create a new SocialService, initializing the DB schema.
    ///
    /// The `users` table must already exist.
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Arc<Self>, SocialError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql }))
    }
}
