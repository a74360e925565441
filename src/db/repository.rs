use sqlx::SqlitePool;

use crate::models::{NewTodo, Todo, TodoChanges, TodoId, UserId};

const TODO_COLUMNS: &str = "id, owner_id, title, description, due_time, completed";

pub async fn fetch_todos(db: &SqlitePool, owner: UserId) -> Result<Vec<Todo>, sqlx::Error> {
    sqlx::query_as::<_, Todo>(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE owner_id = ? ORDER BY id ASC"
    ))
    .bind(owner)
    .fetch_all(db)
    .await
}

pub async fn find_todo(
    db: &SqlitePool,
    owner: UserId,
    id: TodoId,
) -> Result<Option<Todo>, sqlx::Error> {
    sqlx::query_as::<_, Todo>(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

pub async fn insert_todo(db: &SqlitePool, owner: UserId, todo: NewTodo) -> Result<Todo, sqlx::Error> {
    sqlx::query_as::<_, Todo>(&format!(
        r#"
        INSERT INTO todos (owner_id, title, description, due_time, completed)
        VALUES (?1, ?2, ?3, ?4, 0)
        RETURNING {TODO_COLUMNS}
        "#
    ))
    .bind(owner)
    .bind(todo.title)
    .bind(todo.description)
    .bind(todo.due_time)
    .fetch_one(db)
    .await
}

/// Applies `changes` in one statement so concurrent writers to the same row
/// cannot interleave between a read and a write.
pub async fn update_todo(
    db: &SqlitePool,
    owner: UserId,
    id: TodoId,
    changes: TodoChanges,
) -> Result<Option<Todo>, sqlx::Error> {
    sqlx::query_as::<_, Todo>(&format!(
        r#"
        UPDATE todos
        SET title = COALESCE(?1, title),
            description = COALESCE(?2, description),
            due_time = COALESCE(?3, due_time),
            completed = COALESCE(?4, completed)
        WHERE id = ?5 AND owner_id = ?6
        RETURNING {TODO_COLUMNS}
        "#
    ))
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.due_time)
    .bind(changes.completed)
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

pub async fn delete_todo(db: &SqlitePool, owner: UserId, id: TodoId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ?1 AND owner_id = ?2")
        .bind(id)
        .bind(owner)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
