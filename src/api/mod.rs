use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo)
                .put(replace_todo)
                .patch(update_todo)
                .delete(delete_todo),
        )
        .with_state(state)
}

/// Ids that do not parse can never match a row, so they are simply not found.
fn parse_id(raw: &str) -> Result<TodoId, AppError> {
    raw.parse::<TodoId>().map_err(|_| AppError::NotFound)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_todos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.store.list(user).await?;
    Ok(Json(todos))
}

async fn create_todo(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<NewTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let req = json_body(payload)?;
    let todo = state.store.create(user, req).await?;
    info!("user {} created todo {}", user, todo.id);
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, AppError> {
    let todo = state.store.get(user, parse_id(&id)?).await?;
    Ok(Json(todo))
}

async fn replace_todo(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let id = parse_id(&id)?;
    let req = json_body(payload)?;
    if let Err(err) = req.require_full() {
        state.store.get(user, id).await?;
        return Err(err);
    }
    let todo = state.store.update(user, id, req).await?;
    info!("user {} replaced todo {}", user, id);
    Ok(Json(todo))
}

async fn update_todo(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let id = parse_id(&id)?;
    let req = json_body(payload)?;
    let todo = state.store.update(user, id, req).await?;
    info!("user {} updated todo {}", user, id);
    Ok(Json(todo))
}

async fn delete_todo(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.store.delete(user, id).await?;
    info!("user {} deleted todo {}", user, id);
    Ok(StatusCode::NO_CONTENT)
}
