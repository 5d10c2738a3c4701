//! Persistence port for users.

use async_trait::async_trait;
use uuid::Uuid;

use crate::users::error::StoreError;
use crate::users::model::User;
use crate::users::pagination::Pagination;

/// Data-store operations the users service depends on.
///
/// Implementations must exclude soft-deleted rows from every read.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Load a live user by id. Zero matches is [`StoreError::NotFound`].
    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError>;

    /// List live users, newest first.
    async fn list_paginated(&self, page: Pagination) -> Result<Vec<User>, StoreError>;
}
