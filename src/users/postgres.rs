//! PostgreSQL-backed user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::users::error::StoreError;
use crate::users::model::User;
use crate::users::pagination::Pagination;
use crate::users::store::UserStore;

const GET_USER_BY_ID: &str = "\
    SELECT id, email, name, created_at, updated_at, deleted_at \
    FROM users \
    WHERE id = $1 AND deleted_at IS NULL";

const LIST_USERS: &str = "\
    SELECT id, email, name, created_at, updated_at, deleted_at \
    FROM users \
    WHERE deleted_at IS NULL \
    ORDER BY created_at DESC \
    LIMIT $1 OFFSET $2";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Build a pool that connects on first use.
///
/// Fails only when the URL cannot be parsed.
pub fn connect_lazy(config: &DatabaseConfig, url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect_lazy(url)
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as::<_, UserRow>(GET_USER_BY_ID)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map(User::from)
            .map_err(map_sqlx_error)
    }

    async fn list_paginated(&self, page: Pagination) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(LIST_USERS)
            .bind(i64::from(page.limit()))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::backend(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(map_sqlx_error(sqlx::Error::RowNotFound), StoreError::NotFound));
    }

    #[test]
    fn other_errors_map_to_backend() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn queries_exclude_soft_deleted_rows() {
        assert!(GET_USER_BY_ID.contains("deleted_at IS NULL"));
        assert!(LIST_USERS.contains("deleted_at IS NULL"));
        assert!(LIST_USERS.contains("ORDER BY created_at DESC"));
    }
}
