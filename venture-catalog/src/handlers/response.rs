//! Response envelopes for catalog handlers
//!
//! Single records are wrapped as `{ "data": record }`; list reads serialize
//! [`crate::catalog::Page`] directly as `{ "data": [...], "pagination": {...} }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Single-item response wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub data: T,
}

impl<T> ItemResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ItemResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// 201 Created with the stored record
#[derive(Debug, Clone)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(ItemResponse::new(self.0))).into_response()
    }
}
