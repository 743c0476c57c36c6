//! Scripted in-memory store for engine and handler tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{CatalogResult, Row, Store};
use crate::query::Statement;

/// Replays queued responses in order and records every statement it sees
#[derive(Debug, Clone, Default)]
pub(crate) struct MockStore {
    responses: Arc<Mutex<VecDeque<CatalogResult<Vec<Row>>>>>,
    executed: Arc<Mutex<Vec<Statement>>>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue rows for the next statement
    pub(crate) fn push_rows(&self, rows: Vec<Value>) -> &Self {
        let rows = rows
            .into_iter()
            .map(|v| match v {
                Value::Object(row) => row,
                other => panic!("mock rows must be objects, got {other}"),
            })
            .collect();
        self.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    /// Queue a failure for the next statement
    pub(crate) fn push_error(&self, error: super::CatalogError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn executed(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }
}

impl Store for MockStore {
    async fn execute(&self, statement: &Statement) -> CatalogResult<Vec<Row>> {
        self.executed.lock().unwrap().push(statement.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
