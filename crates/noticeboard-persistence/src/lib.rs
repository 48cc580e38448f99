//! Noticeboard persistence
//!
//! Filtered, tenant-scoped reads and per-item bulk mutations over a SQLite
//! message store.
//!
//! - [`filter`] compiles untrusted filter expressions into typed predicates
//! - [`visibility`] builds the tenant scoping every statement is ANDed with
//! - [`query`] assembles listings from predicates, sort and page
//! - [`MessageStore`] owns the pool, message lifecycle and bulk mutations

pub mod bulk;
pub mod config;
pub mod error;
pub mod filter;
pub mod query;
pub mod store;
pub mod visibility;

pub use config::DatabaseConfig;
pub use error::{FilterError, StoreError};
pub use filter::{compile, Comparator, Predicate};
pub use query::{ListQuery, Sort};
pub use store::{MessageStore, DEFAULT_PAGE_SIZE};
