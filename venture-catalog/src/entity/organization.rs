use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ColumnSpec, Entity, EntityKind, EntitySpec, FilterField};
use crate::config::CatalogConfig;

/// A company tracked by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub founded_on: NaiveDate,
    pub location: String,
    pub category: String,
    pub funding_amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Organization {
    const KIND: EntityKind = EntityKind::Organization;

    fn spec(config: &CatalogConfig) -> EntitySpec {
        EntitySpec {
            kind: Self::KIND,
            table: "organizations",
            filters: vec![
                FilterField::substring("name", "name"),
                FilterField::substring("category", "category"),
                FilterField::substring("location", "location"),
            ],
            columns: vec![
                ColumnSpec::text("name", "name"),
                ColumnSpec::date("foundedOn", "founded_on"),
                ColumnSpec::text("location", "location"),
                ColumnSpec::choice("category", "category", config.categories.iter().cloned()),
                ColumnSpec::amount("fundingAmount", "funding_amount"),
            ],
        }
    }
}
