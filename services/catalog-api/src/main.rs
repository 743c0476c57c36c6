//! Catalog API service
//!
//! Serves the organization and innovation catalog over HTTP.
//!
//! Configuration is read from `config.toml`, the XDG config directory, and
//! `CATALOG_*` environment variables (for example
//! `CATALOG_DATABASE_URL=postgres://...`).

use anyhow::Context;
use venture_catalog::prelude::*;

const SERVICE_NAME: &str = "catalog-api";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_for_service(SERVICE_NAME).context("failed to load configuration")?;
    init_tracing(&config)?;

    let database = config
        .database
        .clone()
        .context("database.url must be configured")?;

    let pool = create_pool(&database).await?;
    if database.run_migrations {
        run_migrations(&pool).await?;
    } else {
        tracing::info!("Skipping migrations (database.run_migrations = false)");
    }

    let state = AppState::new(config.clone(), PgStore::new(pool));
    let app = router(state);

    if let Err(e) = Server::new(config).serve(app).await {
        tracing::error!("Server exited with error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
