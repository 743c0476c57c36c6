//! Store trait: the only storage capability the engine needs
//!
//! Uses RPITIT (Return Position Impl Trait In Traits) for async methods
//! without `async_trait`. Rows are JSON objects keyed by column name so the
//! trait stays independent of any entity type.

use std::future::Future;

use serde_json::{Map, Value};

use super::{CatalogError, CatalogResult};
use crate::query::Statement;

/// One result row keyed by column name
pub type Row = Map<String, Value>;

/// Executes parameterised statements
///
/// Implementations bind `statement.params` positionally and return every row
/// the statement produces. No transactions or cursors are involved; each call
/// is one independent round-trip.
pub trait Store: Clone + Send + Sync + 'static {
    /// Run a statement and collect its rows
    fn execute(&self, statement: &Statement) -> impl Future<Output = CatalogResult<Vec<Row>>> + Send;

    /// First row, if any
    fn fetch_optional(
        &self,
        statement: &Statement,
    ) -> impl Future<Output = CatalogResult<Option<Row>>> + Send {
        async move { Ok(self.execute(statement).await?.into_iter().next()) }
    }

    /// Read the `total` column of a count statement
    fn count(&self, statement: &Statement) -> impl Future<Output = CatalogResult<i64>> + Send {
        async move {
            self.fetch_optional(statement)
                .await?
                .and_then(|row| row.get("total").and_then(Value::as_i64))
                .ok_or_else(|| CatalogError::unexpected("count statement returned no total"))
        }
    }

    /// Round-trip a trivial statement to prove the store is reachable
    fn ping(&self) -> impl Future<Output = CatalogResult<()>> + Send {
        async move {
            self.execute(&Statement::new("SELECT 1 AS ok", Vec::new()))
                .await
                .map(|_| ())
        }
    }
}
