use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ColumnSpec, Entity, EntityKind, EntitySpec, FilterField};
use crate::config::CatalogConfig;

/// Market maturity stages; fixed, not configurable
pub const ADOPTION_STAGES: [&str; 4] = ["emerging", "growing", "mature", "declining"];

/// Longest description accepted, in characters
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// A technology tracked by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Innovation {
    pub id: i64,
    pub name: String,
    pub sector: String,
    pub description: Option<String>,
    pub adoption_stage: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Innovation {
    const KIND: EntityKind = EntityKind::Innovation;

    fn spec(config: &CatalogConfig) -> EntitySpec {
        EntitySpec {
            kind: Self::KIND,
            table: "innovations",
            filters: vec![
                FilterField::substring("name", "name"),
                FilterField::substring("sector", "sector"),
                FilterField::exact("adoptionStage", "adoption_stage"),
            ],
            columns: vec![
                ColumnSpec::text("name", "name"),
                ColumnSpec::choice("sector", "sector", config.sectors.iter().cloned()),
                ColumnSpec::text("description", "description")
                    .optional()
                    .max_len(DESCRIPTION_MAX_LEN),
                ColumnSpec::choice("adoptionStage", "adoption_stage", ADOPTION_STAGES),
            ],
        }
    }
}
