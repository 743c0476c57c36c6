//! Parameterised statements and their bound values

use chrono::NaiveDate;

use super::filter::Filter;

/// A value bound to a positional `$N` marker
///
/// Caller-supplied text only ever reaches the store through one of these;
/// statement text is assembled from entity descriptors alone.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    /// Untyped NULL, bound as nullable text
    Null,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Statement text plus parameters in marker order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// One page of matching rows, newest first
///
/// `id` breaks ties between rows created in the same transaction so that
/// consecutive pages never overlap.
pub fn select_page(table: &str, filter: &Filter, limit: i64, offset: i64) -> Statement {
    let limit_index = filter.params.len() + 1;
    let sql = format!(
        "SELECT * FROM {table} WHERE {} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
        filter.fragment,
        limit_index,
        limit_index + 1,
    );

    let mut params = filter.params.clone();
    params.push(SqlValue::Integer(limit));
    params.push(SqlValue::Integer(offset));
    Statement::new(sql, params)
}

/// Count of rows matching the same filter as [`select_page`]
pub fn count_matching(table: &str, filter: &Filter) -> Statement {
    Statement::new(
        format!("SELECT COUNT(*) AS total FROM {table} WHERE {}", filter.fragment),
        filter.params.clone(),
    )
}

pub fn select_by_id(table: &str, id: i64) -> Statement {
    Statement::new(
        format!("SELECT * FROM {table} WHERE id = $1"),
        vec![SqlValue::Integer(id)],
    )
}

/// Insert one row and return it with its server-assigned columns
pub fn insert(table: &str, values: Vec<(&'static str, SqlValue)>) -> Statement {
    let (columns, params): (Vec<_>, Vec<_>) = values.into_iter().unzip();
    let markers: Vec<String> = (1..=params.len()).map(|i| format!("${i}")).collect();
    Statement::new(
        format!(
            "INSERT INTO {table} ({}) VALUES ({}) RETURNING *",
            columns.join(", "),
            markers.join(", "),
        ),
        params,
    )
}

/// Delete one row and return the identity it had
pub fn delete_by_id(table: &str, id: i64) -> Statement {
    Statement::new(
        format!("DELETE FROM {table} WHERE id = $1 RETURNING id, name"),
        vec![SqlValue::Integer(id)],
    )
}
