//! HTTP surface for the catalog

pub mod error;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiErrorKind, ApiErrorResponse};
pub use response::{Created, ItemResponse};
pub use routes::{collection, router};
