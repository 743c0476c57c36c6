//! # venture-catalog
//!
//! Filtered listing and partial updates for a catalog of organizations and
//! innovations, served over HTTP and backed by PostgreSQL.
//!
//! ## Features
//!
//! - **Filtered reads**: optional substring/exact filters folded into one
//!   parameterised WHERE clause, with paired data and count statements
//! - **Partial updates**: only the fields a caller sends are assigned;
//!   `updated_at` is always refreshed
//! - **Validation**: per-field errors collected before anything reaches the store
//! - **Storage seam**: the [`Store`](repository::Store) trait, with
//!   [`PgStore`](repository::PgStore) over a sqlx pool
//! - **Ambient stack**: figment config, JSON tracing, tower-http middleware,
//!   health and readiness checks, graceful shutdown
//!
//! ## Example
//!
//! ```rust,no_run
//! use venture_catalog::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load_for_service("catalog-api")?;
//!     init_tracing(&config)?;
//!
//!     let db = config
//!         .database
//!         .clone()
//!         .ok_or_else(|| Error::Internal("database not configured".into()))?;
//!     let pool = create_pool(&db).await?;
//!
//!     let app = router(AppState::new(config.clone(), PgStore::new(pool)));
//!     Server::new(config).serve(app).await
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod health;
pub mod observability;
pub mod query;
pub mod repository;
pub mod server;
pub mod state;
pub mod update;
pub mod validation;

#[cfg(feature = "database")]
pub mod database;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::{Catalog, Deleted, Page};
    pub use crate::config::{CatalogConfig, Config, DatabaseConfig, PaginationConfig};
    pub use crate::entity::{Entity, EntityKind, EntitySpec, Innovation, Organization};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{router, ApiError, ApiErrorKind, Created, ItemResponse};
    pub use crate::health::{health, readiness};
    pub use crate::observability::init_tracing;
    pub use crate::query::{PageRequest, PaginationMeta};
    pub use crate::repository::{CatalogError, CatalogErrorKind, CatalogResult, Store};
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::validation::{FieldError, FieldErrorCode};

    #[cfg(feature = "database")]
    pub use crate::database::{create_pool, run_migrations, MIGRATOR};

    #[cfg(feature = "database")]
    pub use crate::repository::PgStore;

    pub use axum::{
        extract::{Path, Query, State},
        routing::{delete, get, patch, post, put},
        Json, Router,
    };
}
