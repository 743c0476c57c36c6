//! API error types for handler operations
//!
//! Maps [`CatalogError`] onto HTTP status codes and the `{error, code, status}`
//! envelope. Internal failures are logged with full context and answered with
//! a generic message.

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::repository::{CatalogError, CatalogErrorKind};
use crate::validation::FieldError;

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Path id is not a positive integer
    InvalidId,
    /// Body is not a JSON object
    InvalidBody,
    /// Query argument could not be coerced
    InvalidArgument,
    /// Update body names no mutable field
    NoFieldsToUpdate,
    /// Field-level validation failed
    ValidationFailed,
    /// Record not found
    NotFound,
    /// Store reported a constraint violation
    Conflict,
    /// Store unreachable
    ServiceUnavailable,
    /// Anything else
    InternalError,
}

impl ApiErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidId | Self::InvalidBody | Self::InvalidArgument | Self::NoFieldsToUpdate => {
                StatusCode::BAD_REQUEST
            }
            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidId => "INVALID_ID",
            Self::InvalidBody => "INVALID_BODY",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NoFieldsToUpdate => "NO_FIELDS_TO_UPDATE",
            Self::ValidationFailed => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error_code().to_lowercase())
    }
}

/// Error returned from catalog handlers
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Caller-facing message
    pub message: String,
    /// Logged, never returned
    pub detail: Option<String>,
    pub field_errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            field_errors: Vec::new(),
        }
    }

    pub fn invalid_id() -> Self {
        Self::new(ApiErrorKind::InvalidId, "Invalid ID format")
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidBody, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API {} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub code: String,
    pub status: u16,
    /// Field errors grouped by field, present only for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<FieldError>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if status.is_server_error() {
            tracing::error!(
                kind = %self.kind,
                detail = ?self.detail,
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(kind = %self.kind, "API error: {}", self.message);
        }

        let errors = (!self.field_errors.is_empty()).then(|| {
            let mut grouped: BTreeMap<String, Vec<FieldError>> = BTreeMap::new();
            for error in self.field_errors {
                grouped.entry(error.field.clone()).or_default().push(error);
            }
            grouped
        });

        let body = ApiErrorResponse {
            error: self.message,
            code: self.kind.error_code().to_string(),
            status: status.as_u16(),
            errors,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let kind = match err.kind {
            CatalogErrorKind::ValidationFailed => ApiErrorKind::ValidationFailed,
            CatalogErrorKind::NotFound => ApiErrorKind::NotFound,
            CatalogErrorKind::NoFieldsToUpdate => ApiErrorKind::NoFieldsToUpdate,
            CatalogErrorKind::InvalidArgument => ApiErrorKind::InvalidArgument,
            CatalogErrorKind::ConflictingState => ApiErrorKind::Conflict,
            CatalogErrorKind::StoreUnavailable => ApiErrorKind::ServiceUnavailable,
            CatalogErrorKind::Unexpected => ApiErrorKind::InternalError,
        };

        let message = if err.is_internal() {
            if err.is_retriable() {
                "Service temporarily unavailable".to_string()
            } else {
                "An internal error occurred".to_string()
            }
        } else if kind == ApiErrorKind::Conflict {
            "Operation conflicts with existing data".to_string()
        } else {
            err.message.clone()
        };

        let detail = (message != err.message).then(|| err.to_string());

        Self {
            kind,
            message,
            detail,
            field_errors: err.field_errors,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_body(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldErrorCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiErrorKind::InvalidId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiErrorKind::NoFieldsToUpdate.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiErrorKind::ValidationFailed.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiErrorKind::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err: ApiError =
            CatalogError::unexpected("relation \"organizations\" does not exist").into();
        assert_eq!(err.kind, ApiErrorKind::InternalError);
        assert_eq!(err.message, "An internal error occurred");
        assert!(err.detail.unwrap().contains("does not exist"));
    }

    #[test]
    fn test_conflict_message_is_generic() {
        let err: ApiError =
            CatalogError::conflicting_state("duplicate key value violates \"organizations_name_key\"")
                .into();
        assert_eq!(err.kind, ApiErrorKind::Conflict);
        assert!(!err.message.contains("organizations_name_key"));
    }

    #[test]
    fn test_unavailable_store_message_is_generic() {
        let err: ApiError = CatalogError::store_unavailable("connection refused to 10.0.0.5").into();
        assert_eq!(err.kind, ApiErrorKind::ServiceUnavailable);
        assert_eq!(err.message, "Service temporarily unavailable");
        assert!(err.detail.unwrap().contains("10.0.0.5"));
    }

    #[test]
    fn test_not_found_keeps_message() {
        let err: ApiError = CatalogError::not_found("Organization", "4").into();
        assert_eq!(err.kind, ApiErrorKind::NotFound);
        assert_eq!(err.message, "Organization not found");
        assert!(err.detail.is_none());
    }

    #[tokio::test]
    async fn test_validation_body_groups_field_errors() {
        let err: ApiError = CatalogError::validation_failed(vec![
            FieldError::new("name", FieldErrorCode::Required, "name is required"),
            FieldError::new("category", FieldErrorCode::InvalidChoice, "category must be one of: SaaS"),
        ])
        .into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["status"], 422);
        assert_eq!(body["errors"]["name"][0]["code"], "REQUIRED");
        assert_eq!(body["errors"]["category"][0]["code"], "INVALID_CHOICE");
    }
}
