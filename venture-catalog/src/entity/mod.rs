//! Entity descriptors consumed by the engine
//!
//! Each record kind is described by an [`EntitySpec`]: the table it lives in,
//! the ordered list of optional filters a list read accepts, and the ordered
//! list of mutable columns. The query, validation and update builders are
//! driven entirely by this data, so both record kinds share one code path.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::config::CatalogConfig;

mod innovation;
mod organization;

pub use innovation::{Innovation, ADOPTION_STAGES, DESCRIPTION_MAX_LEN};
pub use organization::Organization;

/// Record kind handled by a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Companies and startups
    Organization,
    /// Technologies and their market maturity
    Innovation,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization => write!(f, "Organization"),
            Self::Innovation => write!(f, "Innovation"),
        }
    }
}

/// How a filter value is compared against its column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Case-insensitive substring match (`ILIKE '%value%'`)
    Substring,
    /// Exact equality
    Exact,
}

/// One optional predicate available on a list read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    /// Query-string parameter name
    pub param: &'static str,
    /// Column the predicate applies to
    pub column: &'static str,
    /// Comparison mode
    pub mode: FilterMode,
}

impl FilterField {
    /// Substring filter on `column`, read from `param`
    pub const fn substring(param: &'static str, column: &'static str) -> Self {
        Self {
            param,
            column,
            mode: FilterMode::Substring,
        }
    }

    /// Exact-match filter on `column`, read from `param`
    pub const fn exact(param: &'static str, column: &'static str) -> Self {
        Self {
            param,
            column,
            mode: FilterMode::Exact,
        }
    }
}

/// Value domain of a mutable column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text, optionally bounded in characters
    Text {
        /// Maximum length in characters
        max_len: Option<usize>,
    },
    /// Calendar date in `YYYY-MM-DD` form
    Date,
    /// Non-negative amount, defaults to zero on create
    Amount,
    /// One of a fixed set of values
    Choice(Vec<String>),
}

/// A mutable column and the JSON field that feeds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// JSON field name in request bodies
    pub field: &'static str,
    /// SQL column name
    pub column: &'static str,
    /// Value domain
    pub kind: ColumnKind,
    /// Must be supplied (and non-blank) on create, and never cleared on update
    pub required: bool,
}

impl ColumnSpec {
    /// Required free-text column
    pub fn text(field: &'static str, column: &'static str) -> Self {
        Self {
            field,
            column,
            kind: ColumnKind::Text { max_len: None },
            required: true,
        }
    }

    /// Required date column
    pub fn date(field: &'static str, column: &'static str) -> Self {
        Self {
            field,
            column,
            kind: ColumnKind::Date,
            required: true,
        }
    }

    /// Optional amount column
    pub fn amount(field: &'static str, column: &'static str) -> Self {
        Self {
            field,
            column,
            kind: ColumnKind::Amount,
            required: false,
        }
    }

    /// Required enumerated column
    pub fn choice<I, T>(field: &'static str, column: &'static str, choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            field,
            column,
            kind: ColumnKind::Choice(choices.into_iter().map(Into::into).collect()),
            required: true,
        }
    }

    /// Make the column optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Bound a text column's length
    #[must_use]
    pub fn max_len(mut self, max_len: usize) -> Self {
        if let ColumnKind::Text { .. } = self.kind {
            self.kind = ColumnKind::Text {
                max_len: Some(max_len),
            };
        }
        self
    }
}

/// Full description of one record kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    /// Record kind
    pub kind: EntityKind,
    /// Table name
    pub table: &'static str,
    /// List-read filters in the order their predicates are emitted
    pub filters: Vec<FilterField>,
    /// Mutable columns in the order assignments and inserts are emitted
    pub columns: Vec<ColumnSpec>,
}

impl EntitySpec {
    /// Look up a column by its JSON field name
    pub fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Look up a column by its SQL name
    pub fn column_named(&self, column: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.column == column)
    }
}

/// A stored record kind with a typed row shape
///
/// Rows arrive from the store keyed by column name and are decoded into
/// `Self`; responses serialize `Self` with camelCase keys.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Record kind
    const KIND: EntityKind;

    /// Build the descriptor for this kind from deployment configuration
    fn spec(config: &CatalogConfig) -> EntitySpec;
}
