use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewTodoRequest, Todo, TodoId, TodoRules, UpdateTodoRequest, UserId};

/// Owner-scoped storage of todos.
///
/// Every operation takes the owner explicitly. A todo that exists but
/// belongs to someone else is reported as `AppError::NotFound`, exactly as
/// if it did not exist.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn list(&self, owner: UserId) -> Result<Vec<Todo>, AppError>;
    async fn create(&self, owner: UserId, req: NewTodoRequest) -> Result<Todo, AppError>;
    async fn get(&self, owner: UserId, id: TodoId) -> Result<Todo, AppError>;
    async fn update(&self, owner: UserId, id: TodoId, req: UpdateTodoRequest) -> Result<Todo, AppError>;
    async fn delete(&self, owner: UserId, id: TodoId) -> Result<(), AppError>;
}

pub struct SqliteTodoStore {
    db: SqlitePool,
    rules: TodoRules,
}

impl SqliteTodoStore {
    pub fn new(db: SqlitePool, rules: TodoRules) -> Self {
        Self { db, rules }
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn list(&self, owner: UserId) -> Result<Vec<Todo>, AppError> {
        Ok(repository::fetch_todos(&self.db, owner).await?)
    }

    async fn create(&self, owner: UserId, req: NewTodoRequest) -> Result<Todo, AppError> {
        let new = req.validate(&self.rules)?;
        let todo = repository::insert_todo(&self.db, owner, new).await?;
        debug!("todo {} created for user {}", todo.id, owner);
        Ok(todo)
    }

    async fn get(&self, owner: UserId, id: TodoId) -> Result<Todo, AppError> {
        repository::find_todo(&self.db, owner, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn update(&self, owner: UserId, id: TodoId, req: UpdateTodoRequest) -> Result<Todo, AppError> {
        // A missing todo is reported before anything wrong with the payload.
        let changes = match req.validate(&self.rules) {
            Ok(changes) => changes,
            Err(err) => {
                self.get(owner, id).await?;
                return Err(err);
            }
        };
        let todo = repository::update_todo(&self.db, owner, id, changes)
            .await?
            .ok_or(AppError::NotFound)?;
        debug!("todo {} updated by user {}", id, owner);
        Ok(todo)
    }

    async fn delete(&self, owner: UserId, id: TodoId) -> Result<(), AppError> {
        if repository::delete_todo(&self.db, owner, id).await? {
            debug!("todo {} deleted by user {}", id, owner);
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
