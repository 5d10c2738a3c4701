//! Domain error taxonomy for the users service.

use thiserror::Error;

/// Boxed error used to carry backend causes across the store boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Signal returned by [`UserStore`](crate::users::store::UserStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The lookup matched zero rows.
    #[error("no matching rows")]
    NotFound,

    /// Any other storage failure.
    #[error("store failure: {0}")]
    Backend(#[source] BoxError),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Backend(err.into())
    }
}

/// Errors produced by [`UserService`](crate::users::service::UserService).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before any store call.
    #[error("{0}")]
    Invalid(String),

    /// The store confirmed that no live user matches.
    #[error("user not found")]
    NotFound,

    /// Infrastructure failure. The cause is kept for diagnostics only.
    #[error("internal error")]
    Internal(#[source] StoreError),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
