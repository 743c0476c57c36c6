//! Catalog routes
//!
//! Each record kind is mounted under `/v1/api/{kind}` with the same five
//! routes; the handlers are generic over the store and the record type.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{Map, Value};

use super::error::{ApiError, ApiErrorKind};
use super::response::{Created, ItemResponse};
use crate::catalog::Catalog;
use crate::entity::Entity;
use crate::health::{health, readiness};
use crate::query::PageRequest;
use crate::repository::Store;
use crate::state::AppState;

/// Full application router: health checks plus both catalogs
pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route("/ready", get(readiness::<S>))
        .nest("/v1/api/organizations", collection(state.organizations()))
        .nest("/v1/api/innovations", collection(state.innovations()))
        .fallback(endpoint_not_found)
        .with_state(state)
}

async fn endpoint_not_found() -> ApiError {
    ApiError::new(ApiErrorKind::NotFound, "Endpoint not found")
}

/// The five routes for one record kind
pub fn collection<S: Store, E: Entity, T: Clone + Send + Sync + 'static>(
    catalog: Arc<Catalog<S, E>>,
) -> Router<T> {
    Router::new()
        .route("/read", get(list::<S, E>))
        .route("/read/{id}", get(fetch::<S, E>))
        .route("/create", post(create::<S, E>))
        .route("/update/{id}", put(update::<S, E>).patch(update::<S, E>))
        .route("/delete/{id}", delete(remove::<S, E>))
        .with_state(catalog)
}

async fn list<S: Store, E: Entity>(
    State(catalog): State<Arc<Catalog<S, E>>>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.remove("limit");
    let offset = params.remove("offset");
    let page = PageRequest::resolve(limit.as_deref(), offset.as_deref(), catalog.pagination())?;

    let filters: Map<String, Value> = params
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    let page = catalog.list(&filters, page).await?;
    Ok(Json(page))
}

async fn fetch<S: Store, E: Entity>(
    State(catalog): State<Arc<Catalog<S, E>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = catalog.get(parse_id(&id)?).await?;
    Ok(ItemResponse::new(record))
}

async fn create<S: Store, E: Entity>(
    State(catalog): State<Arc<Catalog<S, E>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = object_body(body)?;
    let record = catalog.create(&payload).await?;
    Ok(Created(record))
}

async fn update<S: Store, E: Entity>(
    State(catalog): State<Arc<Catalog<S, E>>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let payload = object_body(body)?;
    let record = catalog.update(id, &payload).await?;
    Ok(ItemResponse::new(record))
}

async fn remove<S: Store, E: Entity>(
    State(catalog): State<Arc<Catalog<S, E>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = catalog.delete(parse_id(&id)?).await?;
    Ok(ItemResponse::new(deleted))
}

/// Ids are server-assigned positive integers
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(ApiError::invalid_id)
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match body? {
        Json(Value::Object(map)) => Ok(map),
        Json(_) => Err(ApiError::invalid_body("Request body must be a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::query::SqlValue;
    use crate::repository::mock::MockStore;
    use crate::repository::CatalogError;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn app(store: &MockStore) -> Router {
        router(AppState::new(Config::default(), store.clone()))
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn innovation_row() -> Value {
        json!({
            "id": 2,
            "name": "Edge inference",
            "sector": "Computing",
            "description": null,
            "adoption_stage": "growing",
            "created_at": "2024-05-01T12:00:00+00:00",
            "updated_at": "2024-05-01T12:00:00+00:00"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let store = MockStore::new();
        let (status, body) = send(app(&store), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "catalog-api");
    }

    #[tokio::test]
    async fn test_readiness_reports_store_outage() {
        let store = MockStore::new();
        store.push_error(CatalogError::store_unavailable("connection refused"));
        let (status, body) = send(app(&store), Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
        assert_eq!(body["dependencies"]["database"]["healthy"], false);
    }

    #[tokio::test]
    async fn test_list_with_filters_and_paging() {
        let store = MockStore::new();
        store
            .push_rows(vec![innovation_row()])
            .push_rows(vec![json!({ "total": 3 })]);

        let (status, body) = send(
            app(&store),
            Method::GET,
            "/v1/api/innovations/read?adoptionStage=growing&sector=&limit=1&offset=1",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["adoptionStage"], "growing");
        assert_eq!(
            body["pagination"],
            json!({ "total": 3, "limit": 1, "offset": 1, "hasMore": true })
        );

        let executed = store.executed();
        assert_eq!(
            executed[1].sql,
            "SELECT COUNT(*) AS total FROM innovations WHERE 1=1 AND adoption_stage = $1"
        );
        assert_eq!(executed[1].params, vec![SqlValue::from("growing")]);
    }

    #[tokio::test]
    async fn test_list_rejects_non_numeric_limit() {
        let store = MockStore::new();
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/v1/api/organizations/read?limit=many",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_id() {
        let store = MockStore::new();
        for uri in [
            "/v1/api/organizations/read/abc",
            "/v1/api/organizations/read/0",
            "/v1/api/innovations/delete/-4",
        ] {
            let method = if uri.contains("delete") {
                Method::DELETE
            } else {
                Method::GET
            };
            let (status, body) = send(app(&store), method, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], "Invalid ID format");
        }
    }

    #[tokio::test]
    async fn test_unknown_endpoint_uses_error_envelope() {
        let store = MockStore::new();
        for uri in ["/v1/api/organizations/nope", "/v2/anything"] {
            let (status, body) = send(app(&store), Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(
                body,
                json!({ "error": "Endpoint not found", "code": "NOT_FOUND", "status": 404 })
            );
        }
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_nul_in_filter_is_a_field_error() {
        let store = MockStore::new();
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/v1/api/organizations/read?name=%00",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"][0]["code"], "INVALID_FORMAT");
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_year_zero_create_is_rejected() {
        let store = MockStore::new();
        let (status, body) = send(
            app(&store),
            Method::POST,
            "/v1/api/organizations/create",
            Some(json!({
                "name": "Acme",
                "foundedOn": "0000-01-01",
                "location": "NY",
                "category": "SaaS"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["foundedOn"][0]["code"], "INVALID_DATE");
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let store = MockStore::new();
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/v1/api/innovations/read/77",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_returns_201() {
        let store = MockStore::new();
        store.push_rows(vec![innovation_row()]);

        let (status, body) = send(
            app(&store),
            Method::POST,
            "/v1/api/innovations/create",
            Some(json!({
                "name": "Edge inference",
                "sector": "Computing",
                "adoptionStage": "growing"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["id"], 2);
        assert!(body["data"]["description"].is_null());
    }

    #[tokio::test]
    async fn test_create_validation_failure() {
        let store = MockStore::new();
        let (status, body) = send(
            app(&store),
            Method::POST,
            "/v1/api/organizations/create",
            Some(json!({ "name": "Acme", "foundedOn": "2020/01/01", "fundingAmount": -5 })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["foundedOn"][0]["code"], "INVALID_FORMAT");
        assert_eq!(body["errors"]["fundingAmount"][0]["code"], "OUT_OF_RANGE");
        assert_eq!(body["errors"]["location"][0]["code"], "REQUIRED");
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_non_object_body() {
        let store = MockStore::new();
        let (status, body) = send(
            app(&store),
            Method::POST,
            "/v1/api/organizations/create",
            Some(json!(["not", "an", "object"])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_update_with_no_fields() {
        let store = MockStore::new();
        let (status, body) = send(
            app(&store),
            Method::PUT,
            "/v1/api/organizations/update/1",
            Some(json!({ "createdAt": "2020-01-01T00:00:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_FIELDS_TO_UPDATE");
        assert_eq!(body["error"], "No valid fields to update");
    }

    #[tokio::test]
    async fn test_patch_update() {
        let store = MockStore::new();
        let mut row = innovation_row();
        row["adoption_stage"] = json!("mature");
        store.push_rows(vec![row]);

        let (status, body) = send(
            app(&store),
            Method::PATCH,
            "/v1/api/innovations/update/2",
            Some(json!({ "adoptionStage": "mature" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["adoptionStage"], "mature");
    }

    #[tokio::test]
    async fn test_conflict_on_duplicate() {
        let store = MockStore::new();
        store.push_error(CatalogError::conflicting_state("duplicate key"));
        let (status, body) = send(
            app(&store),
            Method::POST,
            "/v1/api/organizations/create",
            Some(json!({
                "name": "Acme",
                "foundedOn": "2020-01-01",
                "location": "NY",
                "category": "SaaS"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_delete_returns_identity() {
        let store = MockStore::new();
        store.push_rows(vec![json!({ "id": 2, "name": "Edge inference" })]);
        let (status, body) = send(
            app(&store),
            Method::DELETE,
            "/v1/api/innovations/delete/2",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "data": { "id": 2, "name": "Edge inference" } }));
    }
}
