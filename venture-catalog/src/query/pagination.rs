//! Pagination calculator and paging argument coercion

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::repository::{CatalogError, CatalogResult};

/// Pagination descriptor returned alongside a list read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

/// Combine the requested window with what the store returned
///
/// Pure; `limit` and `offset` are expected to be already clamped.
pub fn paginate(limit: i64, offset: i64, fetched: usize, total: i64) -> PaginationMeta {
    let fetched = i64::try_from(fetched).unwrap_or(i64::MAX);
    PaginationMeta {
        total,
        limit,
        offset,
        has_more: offset.saturating_add(fetched) < total,
    }
}

/// Coerced limit/offset for one list read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    /// Coerce raw query-string values
    ///
    /// Missing or empty values take the configured defaults (offset 0).
    /// Negative values clamp to zero and limits clamp to `max_limit`.
    /// Anything that is not an integer is an `InvalidArgument`.
    pub fn resolve(
        limit: Option<&str>,
        offset: Option<&str>,
        config: &PaginationConfig,
    ) -> CatalogResult<Self> {
        let limit = parse_arg("limit", limit)?
            .unwrap_or(config.default_limit)
            .clamp(0, config.max_limit.max(0));
        let offset = parse_arg("offset", offset)?.unwrap_or(0).max(0);
        Ok(Self { limit, offset })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: PaginationConfig::default().default_limit,
            offset: 0,
        }
    }
}

fn parse_arg(name: &str, raw: Option<&str>) -> CatalogResult<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<i64>().map(Some).map_err(|_| {
            CatalogError::invalid_argument(format!("{} must be an integer, got '{}'", name, text))
        }),
    }
}
