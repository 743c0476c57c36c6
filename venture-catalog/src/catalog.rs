//! Generic engine service for one record kind
//!
//! A [`Catalog`] ties an [`EntitySpec`] to a [`Store`] and runs the five
//! operations. Every operation is at most two sequential statements (the
//! paired page and count of a list read) and nothing is retried.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::config::PaginationConfig;
use crate::entity::{Entity, EntitySpec};
use crate::query::{self, paginate, PageRequest, PaginationMeta};
use crate::repository::{CatalogError, CatalogOperation, CatalogResult, Row, Store};
use crate::update::build_update;
use crate::validation::{self, Mode};

/// One page of a list read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<E> {
    pub data: Vec<E>,
    pub pagination: PaginationMeta,
}

/// Identity of a record that was just removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: i64,
    pub name: String,
}

/// Engine for the record kind `E`
#[derive(Debug)]
pub struct Catalog<S, E> {
    store: S,
    spec: EntitySpec,
    pagination: PaginationConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<S: Store, E: Entity> Catalog<S, E> {
    pub fn new(store: S, spec: EntitySpec, pagination: PaginationConfig) -> Self {
        Self {
            store,
            spec,
            pagination,
            _entity: PhantomData,
        }
    }

    pub fn spec(&self) -> &EntitySpec {
        &self.spec
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    /// Filtered, paginated read, newest first
    #[instrument(skip(self, filters), fields(entity = %self.spec.kind))]
    pub async fn list(&self, filters: &Map<String, Value>, page: PageRequest) -> CatalogResult<Page<E>> {
        let errors = validation::validate_filters(&self.spec.filters, filters);
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "List read rejected by validation");
            return Err(CatalogError::validation_failed(errors)
                .with_operation(CatalogOperation::List)
                .with_entity_type(self.spec.kind.to_string()));
        }

        let filter = query::build_filter(&self.spec.filters, filters);
        let data = query::select_page(self.spec.table, &filter, page.limit, page.offset);
        let count = query::count_matching(self.spec.table, &filter);

        let rows = self
            .store
            .execute(&data)
            .await
            .map_err(|e| self.annotate(e, CatalogOperation::List))?;
        let total = self
            .store
            .count(&count)
            .await
            .map_err(|e| self.annotate(e, CatalogOperation::List))?;

        let records = rows
            .into_iter()
            .map(|row| self.decode::<E>(row, CatalogOperation::List))
            .collect::<CatalogResult<Vec<_>>>()?;
        let pagination = paginate(page.limit, page.offset, records.len(), total);

        tracing::debug!(
            predicates = filter.predicate_count(),
            fetched = records.len(),
            total,
            "List read complete"
        );

        Ok(Page {
            data: records,
            pagination,
        })
    }

    #[instrument(skip(self), fields(entity = %self.spec.kind))]
    pub async fn get(&self, id: i64) -> CatalogResult<E> {
        let row = self
            .store
            .fetch_optional(&query::select_by_id(self.spec.table, id))
            .await
            .map_err(|e| self.annotate(e, CatalogOperation::Get))?
            .ok_or_else(|| self.not_found(id, CatalogOperation::Get))?;

        self.decode(row, CatalogOperation::Get)
    }

    /// Validate and insert; returns the stored record with server-assigned fields
    #[instrument(skip(self, payload), fields(entity = %self.spec.kind))]
    pub async fn create(&self, payload: &Map<String, Value>) -> CatalogResult<E> {
        let values = validation::insert_values(&self.spec, payload).map_err(|e| {
            tracing::debug!(errors = e.field_errors.len(), "Create rejected by validation");
            e.with_operation(CatalogOperation::Create)
        })?;

        let row = self
            .store
            .fetch_optional(&query::insert(self.spec.table, values))
            .await
            .map_err(|e| self.annotate(e, CatalogOperation::Create))?
            .ok_or_else(|| {
                CatalogError::unexpected("insert returned no row")
                    .with_operation(CatalogOperation::Create)
                    .with_entity_type(self.spec.kind.to_string())
            })?;

        let record = self.decode(row, CatalogOperation::Create)?;
        tracing::info!("{} created", self.spec.kind);
        Ok(record)
    }

    /// Apply only the fields present in `payload`
    ///
    /// Issued as one conditional statement, so a concurrent delete surfaces
    /// as `NotFound` instead of a write to a vanished row.
    #[instrument(skip(self, payload), fields(entity = %self.spec.kind))]
    pub async fn update(&self, id: i64, payload: &Map<String, Value>) -> CatalogResult<E> {
        let errors = validation::validate(&self.spec, payload, Mode::Update);
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "Update rejected by validation");
            return Err(CatalogError::validation_failed(errors)
                .with_operation(CatalogOperation::Update)
                .with_entity(self.spec.kind.to_string(), id.to_string()));
        }

        let update = build_update(&self.spec, payload)
            .map_err(|e| e.with_entity(self.spec.kind.to_string(), id.to_string()))?;

        let row = self
            .store
            .fetch_optional(&update.statement(self.spec.table, id))
            .await
            .map_err(|e| self.annotate(e, CatalogOperation::Update))?
            .ok_or_else(|| self.not_found(id, CatalogOperation::Update))?;

        let record = self.decode(row, CatalogOperation::Update)?;
        tracing::info!(fields = ?update.columns(), "{} {} updated", self.spec.kind, id);
        Ok(record)
    }

    /// Physically remove a record and return the identity it had
    #[instrument(skip(self), fields(entity = %self.spec.kind))]
    pub async fn delete(&self, id: i64) -> CatalogResult<Deleted> {
        let row = self
            .store
            .fetch_optional(&query::delete_by_id(self.spec.table, id))
            .await
            .map_err(|e| self.annotate(e, CatalogOperation::Delete))?
            .ok_or_else(|| self.not_found(id, CatalogOperation::Delete))?;

        let deleted: Deleted = self.decode(row, CatalogOperation::Delete)?;
        tracing::info!("{} {} deleted", self.spec.kind, deleted.id);
        Ok(deleted)
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, row: Row, operation: CatalogOperation) -> CatalogResult<T> {
        serde_json::from_value(Value::Object(row)).map_err(|e| {
            CatalogError::unexpected(format!("failed to decode {} row: {}", self.spec.kind, e))
                .with_operation(operation)
                .with_entity_type(self.spec.kind.to_string())
        })
    }

    fn annotate(&self, mut error: CatalogError, operation: CatalogOperation) -> CatalogError {
        // store rejections name SQL columns; callers know JSON fields
        for field_error in &mut error.field_errors {
            if let Some(column) = self.spec.column_named(&field_error.field) {
                field_error.message = field_error.message.replacen(column.column, column.field, 1);
                field_error.field = column.field.to_string();
            }
        }

        if error.is_internal() {
            tracing::error!(
                operation = %operation,
                retriable = error.is_retriable(),
                "{} store failure: {}",
                self.spec.kind,
                error.message
            );
        }

        error
            .with_operation(operation)
            .with_entity_type(self.spec.kind.to_string())
    }

    fn not_found(&self, id: i64, operation: CatalogOperation) -> CatalogError {
        tracing::debug!("{} {} not found", self.spec.kind, id);
        CatalogError::not_found(self.spec.kind.to_string(), id.to_string()).with_operation(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::entity::{Innovation, Organization};
    use crate::query::SqlValue;
    use crate::repository::mock::MockStore;
    use crate::repository::CatalogErrorKind;
    use crate::validation::{FieldError, FieldErrorCode};
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test body must be an object"),
        }
    }

    fn organizations(store: MockStore) -> Catalog<MockStore, Organization> {
        Catalog::new(
            store,
            Organization::spec(&CatalogConfig::default()),
            PaginationConfig::default(),
        )
    }

    fn innovations(store: MockStore) -> Catalog<MockStore, Innovation> {
        Catalog::new(
            store,
            Innovation::spec(&CatalogConfig::default()),
            PaginationConfig::default(),
        )
    }

    fn acme_row(funding: f64, updated_at: &str) -> Value {
        json!({
            "id": 1,
            "name": "Acme",
            "founded_on": "2020-01-01",
            "location": "NY",
            "category": "SaaS",
            "funding_amount": funding,
            "created_at": "2024-05-01T12:00:00+00:00",
            "updated_at": updated_at
        })
    }

    #[tokio::test]
    async fn test_list_pairs_page_and_count() {
        let store = MockStore::new();
        store
            .push_rows(vec![
                acme_row(0.0, "2024-05-01T12:00:00+00:00"),
                acme_row(10.0, "2024-05-01T12:00:00+00:00"),
            ])
            .push_rows(vec![json!({ "total": 12 })]);
        let catalog = organizations(store.clone());

        let page = catalog
            .list(
                &body(json!({ "name": "ac", "category": "" })),
                PageRequest { limit: 5, offset: 10 },
            )
            .await
            .unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.pagination.total, 12);
        assert!(!page.pagination.has_more);

        let executed = store.executed();
        assert_eq!(executed.len(), 2);
        let (data, count) = (&executed[0], &executed[1]);
        assert!(data.sql.contains("WHERE 1=1 AND name ILIKE $1 ORDER BY"));
        assert!(count.sql.ends_with("WHERE 1=1 AND name ILIKE $1"));
        assert_eq!(count.params, vec![SqlValue::from("%ac%")]);
        assert_eq!(&data.params[..1], count.params.as_slice());
    }

    #[tokio::test]
    async fn test_short_page_before_the_end_has_more() {
        let store = MockStore::new();
        store
            .push_rows(vec![acme_row(0.0, "2024-05-01T12:00:00+00:00")])
            .push_rows(vec![json!({ "total": 12 })]);

        let page = organizations(store)
            .list(&Map::new(), PageRequest { limit: 5, offset: 10 })
            .await
            .unwrap();

        assert_eq!(page.data.len(), 1);
        assert!(page.pagination.has_more);
    }

    #[tokio::test]
    async fn test_list_rejects_nul_filter_without_touching_the_store() {
        let store = MockStore::new();
        let err = organizations(store.clone())
            .list(&body(json!({ "name": "\0" })), PageRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, CatalogErrorKind::ValidationFailed);
        assert_eq!(err.field_errors[0].field, "name");
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_store_rejection_names_the_json_field() {
        let store = MockStore::new();
        let mut rejected = CatalogError::new(
            CatalogOperation::Execute,
            CatalogErrorKind::ValidationFailed,
            "A value was rejected by the store",
        );
        rejected.field_errors.push(FieldError::new(
            "founded_on",
            FieldErrorCode::Rejected,
            "founded_on was rejected by the store",
        ));
        store.push_error(rejected);

        let err = organizations(store)
            .update(4, &body(json!({ "foundedOn": "2020-01-01" })))
            .await
            .unwrap_err();

        assert_eq!(err.kind, CatalogErrorKind::ValidationFailed);
        assert_eq!(err.operation, CatalogOperation::Update);
        assert_eq!(err.field_errors[0].field, "foundedOn");
        assert_eq!(err.field_errors[0].message, "foundedOn was rejected by the store");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MockStore::new();
        let err = organizations(store).get(99).await.unwrap_err();
        assert_eq!(err.kind, CatalogErrorKind::NotFound);
        assert_eq!(err.entity_id.as_deref(), Some("99"));
    }

    #[tokio::test]
    async fn test_create_validation_never_reaches_store() {
        let store = MockStore::new();
        let err = organizations(store.clone())
            .create(&body(json!({ "name": "", "foundedOn": "2020-01-01" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind, CatalogErrorKind::ValidationFailed);
        assert_eq!(err.operation, CatalogOperation::Create);
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_create_defaults_funding() {
        let store = MockStore::new();
        store.push_rows(vec![acme_row(0.0, "2024-05-01T12:00:00+00:00")]);

        let org = organizations(store.clone())
            .create(&body(json!({
                "name": "Acme",
                "foundedOn": "2020-01-01",
                "location": "NY",
                "category": "SaaS"
            })))
            .await
            .unwrap();

        assert_eq!(org.funding_amount, 0.0);
        assert_eq!(org.created_at, org.updated_at);
        let insert = &store.executed()[0];
        assert!(insert.sql.starts_with("INSERT INTO organizations"));
        assert_eq!(insert.params[4], SqlValue::Float(0.0));
    }

    #[tokio::test]
    async fn test_update_is_one_conditional_statement() {
        let store = MockStore::new();
        store.push_rows(vec![acme_row(1000.0, "2024-05-02T09:00:00+00:00")]);

        let org = organizations(store.clone())
            .update(1, &body(json!({ "fundingAmount": 1000 })))
            .await
            .unwrap();

        assert_eq!(org.funding_amount, 1000.0);
        assert!(org.updated_at > org.created_at);

        let executed = store.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0].sql,
            "UPDATE organizations SET funding_amount=$1, updated_at=now() WHERE id=$2 RETURNING *"
        );
        assert_eq!(
            executed[0].params,
            vec![SqlValue::Float(1000.0), SqlValue::Integer(1)]
        );
    }

    #[tokio::test]
    async fn test_update_of_vanished_row_is_not_found() {
        let store = MockStore::new();
        let err = innovations(store)
            .update(5, &body(json!({ "adoptionStage": "mature" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind, CatalogErrorKind::NotFound);
        assert_eq!(err.operation, CatalogOperation::Update);
    }

    #[tokio::test]
    async fn test_empty_update_builds_nothing() {
        let store = MockStore::new();
        let err = innovations(store.clone())
            .update(5, &Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, CatalogErrorKind::NoFieldsToUpdate);
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_identity() {
        let store = MockStore::new();
        store.push_rows(vec![json!({ "id": 3, "name": "Edge inference" })]);

        let deleted = innovations(store).delete(3).await.unwrap();
        assert_eq!(
            deleted,
            Deleted {
                id: 3,
                name: "Edge inference".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_store_errors_keep_their_kind() {
        let store = MockStore::new();
        store.push_error(CatalogError::conflicting_state("duplicate key"));

        let err = organizations(store)
            .create(&body(json!({
                "name": "Acme",
                "foundedOn": "2020-01-01",
                "location": "NY",
                "category": "SaaS"
            })))
            .await
            .unwrap_err();
        assert_eq!(err.kind, CatalogErrorKind::ConflictingState);
        assert_eq!(err.operation, CatalogOperation::Create);
        assert_eq!(err.entity_type.as_deref(), Some("Organization"));
    }

    #[tokio::test]
    async fn test_undecodable_row_is_unexpected() {
        let store = MockStore::new();
        store.push_rows(vec![json!({ "id": "not-a-number" })]);
        let err = organizations(store).get(1).await.unwrap_err();
        assert_eq!(err.kind, CatalogErrorKind::Unexpected);
    }
}
