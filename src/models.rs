use chrono::NaiveDateTime;
use serde::Serialize;

/// A short link record from the `short_links` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ShortLink {
    pub short_id: String,
    pub target_url: String,
    pub created_at: NaiveDateTime,
}

/// A task from the `todo_items` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

/// Completion counts across all tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TodoStats {
    pub total: i64,
    pub completed: i64,
    pub incomplete: i64,
}
