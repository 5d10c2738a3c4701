//! Users resource: domain model, persistence port and service.
//!
//! # Data Flow
//! ```text
//! handler
//!     → service.rs (validate id, clamp pagination, translate errors)
//!     → store.rs (UserStore port)
//!         → postgres.rs (sqlx)      | memory.rs (in-process fake)
//! ```

pub mod error;
pub mod memory;
pub mod model;
pub mod pagination;
pub mod postgres;
pub mod service;
pub mod store;

pub use error::{ServiceError, StoreError};
pub use memory::InMemoryUserStore;
pub use model::{User, UserPage};
pub use pagination::Pagination;
pub use postgres::PgUserStore;
pub use service::UserService;
pub use store::UserStore;
