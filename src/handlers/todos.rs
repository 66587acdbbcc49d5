use crate::{
    db,
    error::{ApiError, ApiResult},
    models::{TodoItem, TodoStats},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct TodoForm {
    title: String,
    description: Option<String>,
    #[serde(default)]
    completed: bool,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    completed: bool,
}

const NOT_FOUND: &str = "Item not found";

impl TodoForm {
    /// Trimmed title and description; blank descriptions become `None`.
    fn cleaned(&self) -> ApiResult<(&str, Option<&str>)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::Unprocessable("Title must not be empty".into()));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        Ok((title, description))
    }
}

/// POST /todo/item
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TodoForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TodoItem>)> {
    let Json(form) = payload?;
    let (title, description) = form.cleaned()?;
    let item = db::create_todo(&state.db, title, description, form.completed).await?;
    tracing::debug!(id = item.id, "Todo item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /todo/items
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<TodoItem>>> {
    Ok(Json(db::list_todos(&state.db).await?))
}

/// GET /todo/item/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TodoItem>> {
    db::get_todo(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))
}

/// PUT /todo/item/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<TodoForm>, JsonRejection>,
) -> ApiResult<Json<TodoItem>> {
    let Json(form) = payload?;
    let (title, description) = form.cleaned()?;
    db::update_todo(&state.db, id, title, description, form.completed)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))
}

/// PATCH /todo/item/:id/status?completed=true
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<TodoItem>> {
    db::set_todo_status(&state.db, id, query.completed)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))
}

/// DELETE /todo/item/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !db::delete_todo(&state.db, id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.into()));
    }

    Ok(Json(json!({
        "message": format!("Item {id} deleted")
    })))
}

/// GET /todo/items/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<TodoStats>> {
    Ok(Json(db::todo_stats(&state.db).await?))
}
