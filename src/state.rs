//! Shared application state for all routes.

use crate::config::ResolvedModel;
use crate::service::EntityStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Store handle built by the bootstrap; the only path to the database.
    pub store: Arc<dyn EntityStore>,
    pub model: Arc<ResolvedModel>,
}

impl AppState {
    pub fn new<S: EntityStore + 'static>(store: S, model: ResolvedModel) -> Self {
        AppState {
            store: Arc::new(store),
            model: Arc::new(model),
        }
    }
}
