use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::cascade::Resolver;
use crate::services::generator::Chef;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub resolver: Arc<Resolver<Chef>>,
}

impl AppState {
    pub fn new(db: SqlitePool, resolver: Resolver<Chef>) -> Self {
        Self {
            db,
            resolver: Arc::new(resolver),
        }
    }
}
