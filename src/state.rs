use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{Authenticator, TokenAuthenticator};
use crate::models::TodoRules;
use crate::store::{SqliteTodoStore, TodoStore};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: Arc<dyn TodoStore>,
    pub auth: Arc<dyn Authenticator>,
}

impl AppState {
    /// SQLite-backed store and token authentication sharing one pool.
    pub fn new(db: SqlitePool, rules: TodoRules) -> Self {
        Self {
            store: Arc::new(SqliteTodoStore::new(db.clone(), rules)),
            auth: Arc::new(TokenAuthenticator::new(db.clone())),
            db,
        }
    }
}
