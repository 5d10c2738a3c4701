//! Users service: validation, pagination bounds and error translation.
//!
//! This is the only place store signals are interpreted. Callers above it
//! see [`ServiceError`] and nothing storage-specific.

use std::sync::Arc;
use uuid::Uuid;

use crate::observability::context::CorrelationContext;
use crate::users::error::{ServiceError, StoreError};
use crate::users::model::{User, UserPage};
use crate::users::pagination::Pagination;
use crate::users::store::UserStore;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Validate a raw identifier before it can reach the store.
    pub fn parse_id(raw: &str) -> Result<Uuid, ServiceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ServiceError::invalid("user ID is required"));
        }
        Uuid::parse_str(raw).map_err(|_| ServiceError::invalid("invalid user ID format"))
    }

    /// Fetch a live user.
    pub async fn get_by_id(&self, ctx: &CorrelationContext, id: Uuid) -> Result<User, ServiceError> {
        match self.store.get_by_id(id).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound) => Err(ServiceError::NotFound),
            Err(err) => {
                tracing::error!(parent: ctx.span(), user_id = %id, error = %err, "Failed to get user");
                Err(ServiceError::Internal(err))
            }
        }
    }

    /// List live users, newest first, after clamping the requested window.
    pub async fn list(
        &self,
        ctx: &CorrelationContext,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<UserPage, ServiceError> {
        let page = Pagination::clamped(limit, offset);

        let users = self.store.list_paginated(page).await.map_err(|err| {
            tracing::error!(
                parent: ctx.span(),
                limit = page.limit(),
                offset = page.offset(),
                error = %err,
                "Failed to list users"
            );
            ServiceError::Internal(err)
        })?;

        Ok(UserPage {
            users,
            limit: page.limit(),
            offset: page.offset(),
        })
    }
}
