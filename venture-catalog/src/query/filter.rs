//! Statement builder for optional list-read filters
//!
//! The same [`Filter`] feeds both the page statement and its count statement,
//! which is what keeps `total` consistent with the rows returned.

use serde_json::{Map, Value};

use super::statement::SqlValue;
use crate::entity::{FilterField, FilterMode};

/// WHERE fragment and the parameters its markers refer to
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Always starts with `1=1`, never empty
    pub fragment: String,
    /// `params[i]` is bound to `$i+1`
    pub params: Vec<SqlValue>,
}

impl Filter {
    /// Number of predicates appended after the base predicate
    pub fn predicate_count(&self) -> usize {
        self.params.len()
    }
}

/// Build the WHERE fragment for the supplied filter values
///
/// Fields are visited in `fields` order, not map order. A field contributes a
/// predicate only when its value is present and not blank: missing, null,
/// `""`, `0` and `false` all mean "not filtering on this field".
pub fn build_filter(fields: &[FilterField], supplied: &Map<String, Value>) -> Filter {
    let mut fragment = String::from("1=1");
    let mut params = Vec::new();

    for field in fields {
        let Some(text) = supplied.get(field.param).and_then(filter_text) else {
            continue;
        };

        let index = params.len() + 1;
        match field.mode {
            FilterMode::Substring => {
                fragment.push_str(&format!(" AND {} ILIKE ${}", field.column, index));
                params.push(SqlValue::Text(format!("%{}%", text)));
            }
            FilterMode::Exact => {
                fragment.push_str(&format!(" AND {} = ${}", field.column, index));
                params.push(SqlValue::Text(text));
            }
        }
    }

    Filter { fragment, params }
}

/// Text form of a filter value, or `None` when it is blank
fn filter_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
