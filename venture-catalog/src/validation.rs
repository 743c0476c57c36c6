//! Validation gate
//!
//! Synchronous checks applied to a request body before any statement is
//! built. Create runs every column; update runs only the columns whose keys
//! are present in the body. All failures are collected and returned together.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{ColumnKind, ColumnSpec, EntitySpec, FilterField};
use crate::query::SqlValue;
use crate::repository::{CatalogError, CatalogResult};

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

/// Which operation the payload is validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// All required columns must be present
    Create,
    /// Only present keys are checked
    Update,
}

/// Machine-readable reason attached to a field error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldErrorCode {
    /// Missing, null or blank where a value is required
    Required,
    /// Date text does not match `YYYY-MM-DD`
    InvalidFormat,
    /// Date text matches the pattern but names no calendar day
    InvalidDate,
    /// Amount does not parse as a number
    InvalidNumber,
    /// Amount is negative
    OutOfRange,
    /// Value is not in the permitted set
    InvalidChoice,
    /// Text exceeds its maximum length
    TooLong,
    /// JSON type does not fit the column
    InvalidType,
    /// The store rejected the bound value
    Rejected,
}

impl fmt::Display for FieldErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Required => "REQUIRED",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidDate => "INVALID_DATE",
            Self::InvalidNumber => "INVALID_NUMBER",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::InvalidChoice => "INVALID_CHOICE",
            Self::TooLong => "TOO_LONG",
            Self::InvalidType => "INVALID_TYPE",
            Self::Rejected => "REJECTED",
        };
        f.write_str(code)
    }
}

/// One failed check on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON field name
    pub field: String,
    /// Reason code
    pub code: FieldErrorCode,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }

    /// `field` starts out as the SQL column the store named; the catalog
    /// maps it back to the JSON field
    #[cfg(feature = "database")]
    pub(crate) fn rejected_by_store(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{} was rejected by the store", field);
        Self::new(field, FieldErrorCode::Rejected, message)
    }
}

/// Check `payload` against `spec` and return every failure
///
/// An empty vector means the payload may proceed. Keys the descriptor does not
/// know (including `id` and the timestamps) are ignored here; the update
/// builder never writes them.
pub fn validate(spec: &EntitySpec, payload: &Map<String, Value>, mode: Mode) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for column in &spec.columns {
        let value = payload.get(column.field);

        match (mode, value) {
            (Mode::Update, None) => continue,
            (Mode::Create, None) | (Mode::Create, Some(Value::Null)) => {
                if column.required {
                    errors.push(required(column));
                }
                continue;
            }
            (Mode::Create, Some(v)) if is_blank_text(v) && !column.required => {
                continue;
            }
            _ => {}
        }

        if let Some(value) = value {
            if let Err(error) = column_value(column, value) {
                errors.push(error);
            }
        }
    }

    errors
}

/// Check list-read filter values before they are bound
///
/// Filters are free text, so the only shape rule is the one the store
/// enforces on every text parameter: no NUL characters.
pub fn validate_filters(fields: &[FilterField], supplied: &Map<String, Value>) -> Vec<FieldError> {
    fields
        .iter()
        .filter(|f| matches!(supplied.get(f.param), Some(Value::String(s)) if s.contains('\0')))
        .map(|f| {
            FieldError::new(
                f.param,
                FieldErrorCode::InvalidFormat,
                format!("{} must not contain NUL characters", f.param),
            )
        })
        .collect()
}

/// Convert one present value into its bound form
///
/// This is the single place request JSON becomes a statement parameter, so
/// validation and statement building cannot disagree about what is accepted.
pub fn column_value(column: &ColumnSpec, value: &Value) -> Result<SqlValue, FieldError> {
    match &column.kind {
        ColumnKind::Text { max_len } => match value {
            Value::Null if !column.required => Ok(SqlValue::Null),
            Value::Null => Err(required(column)),
            Value::String(s) if column.required && s.trim().is_empty() => Err(required(column)),
            Value::String(s) if s.contains('\0') => Err(contains_nul(column)),
            Value::String(s) => {
                if let Some(max) = max_len {
                    if s.chars().count() > *max {
                        return Err(FieldError::new(
                            column.field,
                            FieldErrorCode::TooLong,
                            format!("{} must be at most {} characters", column.field, max),
                        ));
                    }
                }
                Ok(SqlValue::Text(s.clone()))
            }
            _ => Err(wrong_type(column, "a string")),
        },

        ColumnKind::Date => match value {
            Value::Null => Err(required(column)),
            Value::String(s) if s.trim().is_empty() => Err(required(column)),
            Value::String(s) => {
                if !DATE_PATTERN.is_match(s) {
                    return Err(FieldError::new(
                        column.field,
                        FieldErrorCode::InvalidFormat,
                        format!("{} must be in YYYY-MM-DD format", column.field),
                    ));
                }
                // Year 0 parses but the store keeps it as a BC date
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .filter(|date| date.year() >= 1)
                    .map(SqlValue::Date)
                    .ok_or_else(|| {
                        FieldError::new(
                            column.field,
                            FieldErrorCode::InvalidDate,
                            format!("{} is not a valid calendar date", column.field),
                        )
                    })
            }
            _ => Err(wrong_type(column, "a date string")),
        },

        ColumnKind::Amount => {
            let amount = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .filter(|a| a.is_finite())
            .ok_or_else(|| {
                FieldError::new(
                    column.field,
                    FieldErrorCode::InvalidNumber,
                    format!("{} must be a number", column.field),
                )
            })?;

            if amount < 0.0 {
                return Err(FieldError::new(
                    column.field,
                    FieldErrorCode::OutOfRange,
                    format!("{} must be a non-negative number", column.field),
                ));
            }
            Ok(SqlValue::Float(amount))
        }

        ColumnKind::Choice(choices) => match value {
            Value::String(s) if choices.iter().any(|c| c == s) => Ok(SqlValue::Text(s.clone())),
            Value::Null => Err(required(column)),
            Value::String(s) if s.is_empty() => Err(required(column)),
            Value::String(s) if s.contains('\0') => Err(contains_nul(column)),
            _ => Err(FieldError::new(
                column.field,
                FieldErrorCode::InvalidChoice,
                format!("{} must be one of: {}", column.field, choices.join(", ")),
            )),
        },
    }
}

/// Bound values for an insert, one per column in fixed column order
///
/// Runs the create-mode gate first. Optional columns that are missing, null
/// or blank get their defaults: zero for amounts, NULL for text.
pub fn insert_values(
    spec: &EntitySpec,
    payload: &Map<String, Value>,
) -> CatalogResult<Vec<(&'static str, SqlValue)>> {
    let errors = validate(spec, payload, Mode::Create);
    if !errors.is_empty() {
        return Err(CatalogError::validation_failed(errors).with_entity_type(spec.kind.to_string()));
    }

    let mut values = Vec::with_capacity(spec.columns.len());
    for column in &spec.columns {
        let value = match payload.get(column.field) {
            Some(v) if column.required || !(v.is_null() || is_blank_text(v)) => {
                column_value(column, v).map_err(|e| CatalogError::validation_failed(vec![e]))?
            }
            _ => default_value(column),
        };
        values.push((column.column, value));
    }
    Ok(values)
}

fn default_value(column: &ColumnSpec) -> SqlValue {
    match column.kind {
        ColumnKind::Amount => SqlValue::Float(0.0),
        _ => SqlValue::Null,
    }
}

fn is_blank_text(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}

fn contains_nul(column: &ColumnSpec) -> FieldError {
    FieldError::new(
        column.field,
        FieldErrorCode::InvalidFormat,
        format!("{} must not contain NUL characters", column.field),
    )
}

fn required(column: &ColumnSpec) -> FieldError {
    FieldError::new(
        column.field,
        FieldErrorCode::Required,
        format!("{} is required", column.field),
    )
}

fn wrong_type(column: &ColumnSpec, expected: &str) -> FieldError {
    FieldError::new(
        column.field,
        FieldErrorCode::InvalidType,
        format!("{} must be {}", column.field, expected),
    )
}
