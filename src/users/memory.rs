//! Deterministic in-memory store.
//!
//! Backs the service when no database is configured and stands in for
//! PostgreSQL in tests. Every call is counted, and a failure mode can be
//! switched on to exercise the infrastructure-error path.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use crate::users::error::StoreError;
use crate::users::model::User;
use crate::users::pagination::Pagination;
use crate::users::store::UserStore;

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `users`.
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
            ..Self::default()
        }
    }

    /// A small fixed data set: three live users and one soft-deleted user.
    pub fn seeded() -> Self {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
        let mut users: Vec<User> = ["ada", "grace", "linus"]
            .iter()
            .enumerate()
            .map(|(i, name)| sample_user(name, base + Duration::days(i as i64)))
            .collect();

        let mut removed = sample_user("ghost", base + Duration::days(10));
        removed.deleted_at = Some(base + Duration::days(11));
        users.push(removed);

        Self::with_users(users)
    }

    pub fn insert(&self, user: User) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user);
    }

    /// Number of store operations issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn begin_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::backend("in-memory store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.begin_call()?;
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|u| u.id == id && !u.is_deleted())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_paginated(&self, page: Pagination) -> Result<Vec<User>, StoreError> {
        self.begin_call()?;
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);

        let mut live: Vec<&User> = users.iter().filter(|u| !u.is_deleted()).collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(live
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }
}

/// Build a live user named `name` created at `created_at`.
pub fn sample_user(name: &str, created_at: DateTime<Utc>) -> User {
    User {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", name),
        name: name.to_string(),
        created_at,
        updated_at: created_at,
        deleted_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn soft_deleted_rows_are_invisible() {
        let store = InMemoryUserStore::seeded();
        let ghost = store
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.is_deleted())
            .cloned()
            .unwrap();

        assert!(matches!(store.get_by_id(ghost.id).await, Err(StoreError::NotFound)));

        let listed = store.list_paginated(Pagination::default()).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|u| u.id != ghost.id));
    }

    #[tokio::test]
    async fn lists_newest_first_with_offset_and_limit() {
        let store = InMemoryUserStore::seeded();

        let all = store.list_paginated(Pagination::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["linus", "grace", "ada"]);

        let page = store
            .list_paginated(Pagination::clamped(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "grace");

        let past_end = store
            .list_paginated(Pagination::clamped(Some(10), Some(50)))
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn failure_mode_reports_backend_error_and_counts_calls() {
        let store = InMemoryUserStore::new();
        store.set_failing(true);

        assert!(matches!(
            store.get_by_id(Uuid::new_v4()).await,
            Err(StoreError::Backend(_))
        ));
        assert!(store.list_paginated(Pagination::default()).await.is_err());
        assert_eq!(store.calls(), 2);
    }
}
