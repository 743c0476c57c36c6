//! Storage seam and error classification
//!
//! - [`Store`]: execute a parameterised statement, get rows back
//! - [`PgStore`]: the PostgreSQL implementation (feature `database`)
//! - [`CatalogError`]: the request-path error taxonomy

mod error;
#[cfg(feature = "database")]
mod postgres;
mod store;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{CatalogError, CatalogErrorKind, CatalogOperation};
#[cfg(feature = "database")]
pub use postgres::PgStore;
pub use store::{Row, Store};

/// Result type for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
