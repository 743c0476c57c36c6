//! PostgreSQL store backed by a sqlx pool

use sqlx::PgPool;

use super::{CatalogError, CatalogResult};
use super::store::{Row, Store};
use crate::query::{SqlValue, Statement};

/// [`Store`] over a PostgreSQL connection pool
///
/// Each statement is wrapped so Postgres renders every row as a JSON object
/// (`to_jsonb`), which keeps row decoding independent of the column set.
/// Data-modifying statements with `RETURNING` work because the wrapper is a
/// CTE.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn wrap(sql: &str) -> String {
    format!("WITH r AS ({sql}) SELECT to_jsonb(r) AS row FROM r")
}

impl Store for PgStore {
    async fn execute(&self, statement: &Statement) -> CatalogResult<Vec<Row>> {
        let sql = wrap(&statement.sql);
        let mut query = sqlx::query_scalar::<_, serde_json::Value>(&sql);
        for param in &statement.params {
            query = match param {
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::Integer(v) => query.bind(*v),
                SqlValue::Float(v) => query.bind(*v),
                SqlValue::Date(v) => query.bind(*v),
                SqlValue::Null => query.bind(Option::<String>::None),
            };
        }

        let values = query.fetch_all(&self.pool).await.map_err(|e| {
            let error = CatalogError::from(e);
            tracing::debug!(sql = %statement.sql, kind = %error.kind, "Statement failed");
            error
        })?;

        values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::Object(row) => Ok(row),
                other => Err(CatalogError::unexpected(format!(
                    "expected a JSON object row, got {}",
                    other
                ))),
            })
            .collect()
    }
}
