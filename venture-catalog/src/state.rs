//! Application state shared across handlers

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::entity::{Entity, Innovation, Organization};
use crate::repository::Store;

/// Configuration, the store, and one catalog per record kind
///
/// Built once at startup; everything request handlers need is threaded
/// through here rather than read from process-wide state.
#[derive(Debug)]
pub struct AppState<S> {
    config: Arc<Config>,
    store: S,
    organizations: Arc<Catalog<S, Organization>>,
    innovations: Arc<Catalog<S, Innovation>>,
}

impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            store: self.store.clone(),
            organizations: Arc::clone(&self.organizations),
            innovations: Arc::clone(&self.innovations),
        }
    }
}

impl<S: Store> AppState<S> {
    pub fn new(config: Config, store: S) -> Self {
        let organizations = Catalog::new(
            store.clone(),
            Organization::spec(&config.catalog),
            config.pagination,
        );
        let innovations = Catalog::new(
            store.clone(),
            Innovation::spec(&config.catalog),
            config.pagination,
        );

        Self {
            config: Arc::new(config),
            store,
            organizations: Arc::new(organizations),
            innovations: Arc::new(innovations),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn organizations(&self) -> Arc<Catalog<S, Organization>> {
        Arc::clone(&self.organizations)
    }

    pub fn innovations(&self) -> Arc<Catalog<S, Innovation>> {
        Arc::clone(&self.innovations)
    }
}
