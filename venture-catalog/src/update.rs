//! Partial update builder
//!
//! Only keys present in the request body are written. Presence is decided by
//! key, not value: `{"description": null}` clears the description, while a
//! body without the key leaves it untouched.

use serde_json::{Map, Value};

use crate::entity::{ColumnKind, EntitySpec};
use crate::query::{SqlValue, Statement};
use crate::repository::{CatalogError, CatalogOperation, CatalogResult};
use crate::validation::column_value;

/// Forced modification timestamp; has no bound parameter
const TOUCH_UPDATED_AT: &str = "updated_at=now()";

/// Assignment list for one UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    /// `column=$N` for each present column, then `updated_at=now()`
    pub assignments: Vec<String>,
    /// Parameters for the `$N` markers in `assignments`
    pub params: Vec<SqlValue>,
    /// Marker index reserved for the row id in the WHERE clause
    pub id_param_index: usize,
}

impl PartialUpdate {
    /// Columns written by this update, `updated_at` included
    pub fn columns(&self) -> Vec<&str> {
        self.assignments
            .iter()
            .filter_map(|a| a.split('=').next())
            .collect()
    }

    /// Render as a single conditional statement
    ///
    /// Affects no row when `id` no longer exists, which the caller reports as
    /// not found; there is no separate existence check to race with.
    pub fn statement(&self, table: &str, id: i64) -> Statement {
        let mut params = self.params.clone();
        params.push(SqlValue::Integer(id));
        Statement::new(
            format!(
                "UPDATE {table} SET {} WHERE id=${} RETURNING *",
                self.assignments.join(", "),
                self.id_param_index,
            ),
            params,
        )
    }
}

/// Build the assignment list for the keys present in `present`
///
/// Enumerated columns are checked before anything is assembled. Columns are
/// visited in the descriptor's fixed order so the generated SQL does not
/// depend on map iteration order. Keys the descriptor does not list (`id`,
/// `createdAt`, `updatedAt`, unknown names) are never written.
pub fn build_update(spec: &EntitySpec, present: &Map<String, Value>) -> CatalogResult<PartialUpdate> {
    let choice_errors: Vec<_> = spec
        .columns
        .iter()
        .filter(|c| matches!(c.kind, ColumnKind::Choice(_)))
        .filter_map(|c| present.get(c.field).map(|v| column_value(c, v)))
        .filter_map(Result::err)
        .collect();
    if !choice_errors.is_empty() {
        return Err(rejected(spec, choice_errors));
    }

    let mut assignments = Vec::new();
    let mut params = Vec::new();
    let mut errors = Vec::new();

    for column in &spec.columns {
        let Some(value) = present.get(column.field) else {
            continue;
        };
        match column_value(column, value) {
            Ok(bound) => {
                params.push(bound);
                assignments.push(format!("{}=${}", column.column, params.len()));
            }
            Err(error) => errors.push(error),
        }
    }

    if !errors.is_empty() {
        return Err(rejected(spec, errors));
    }
    if assignments.is_empty() {
        return Err(CatalogError::no_fields_to_update().with_entity_type(spec.kind.to_string()));
    }

    assignments.push(TOUCH_UPDATED_AT.to_string());
    let id_param_index = params.len() + 1;

    Ok(PartialUpdate {
        assignments,
        params,
        id_param_index,
    })
}

fn rejected(spec: &EntitySpec, errors: Vec<crate::validation::FieldError>) -> CatalogError {
    CatalogError::validation_failed(errors)
        .with_operation(CatalogOperation::Update)
        .with_entity_type(spec.kind.to_string())
}
