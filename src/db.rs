use crate::{
    cache::LinkCache,
    models::{TodoItem, TodoStats},
    store::LinkStore,
};
use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;

// ── Connection ─────────────────────────────────────────────────────────────

/// Open the SQLite pool, creating the database file (and its directory) if
/// needed, and apply embedded migrations.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    if let Some(dir) = database_dir(database_url) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create database directory {}", dir.display()))?;
    }

    let options = database_url
        .parse::<SqliteConnectOptions>()
        .with_context(|| format!("invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .context("failed to open SQLite database")?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
///
/// Every connection to `sqlite::memory:` is a fresh database, so the pool is
/// pinned to one connection that never expires.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("failed to open in-memory SQLite database")?;

    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to apply database migrations")?;
    Ok(())
}

/// Directory holding the database file named by `database_url`, if any.
fn database_dir(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

// ── Warm-up ────────────────────────────────────────────────────────────────

/// Load every short link into the resolve cache at startup.
pub async fn warm_cache(store: &dyn LinkStore, cache: &LinkCache) -> anyhow::Result<()> {
    let links = store.list_all().await?;

    for link in links {
        cache.set(link.short_id, link.target_url);
    }

    tracing::info!("Cache warmed with {} short link(s)", cache.len());
    Ok(())
}

// ── Todo items ─────────────────────────────────────────────────────────────

const TODO_COLUMNS: &str = "id, title, description, completed";

/// Insert a new task and return the newly created row.
pub async fn create_todo(
    pool: &SqlitePool,
    title: &str,
    description: Option<&str>,
    completed: bool,
) -> Result<TodoItem, sqlx::Error> {
    let id = sqlx::query("INSERT INTO todo_items (title, description, completed) VALUES (?1, ?2, ?3)")
        .bind(title)
        .bind(description)
        .bind(completed)
        .execute(pool)
        .await?
        .last_insert_rowid();

    let item: TodoItem = sqlx::query_as(&format!(
        "SELECT {TODO_COLUMNS} FROM todo_items WHERE id = ?1"
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

/// Every task, oldest first.
pub async fn list_todos(pool: &SqlitePool) -> Result<Vec<TodoItem>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {TODO_COLUMNS} FROM todo_items ORDER BY id"))
        .fetch_all(pool)
        .await
}

pub async fn get_todo(pool: &SqlitePool, id: i64) -> Result<Option<TodoItem>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {TODO_COLUMNS} FROM todo_items WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Replace every editable field of a task. Returns `None` if it does not exist.
pub async fn update_todo(
    pool: &SqlitePool,
    id: i64,
    title: &str,
    description: Option<&str>,
    completed: bool,
) -> Result<Option<TodoItem>, sqlx::Error> {
    let affected = sqlx::query(
        "UPDATE todo_items SET title = ?1, description = ?2, completed = ?3 WHERE id = ?4",
    )
    .bind(title)
    .bind(description)
    .bind(completed)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Ok(None);
    }
    get_todo(pool, id).await
}

/// Flip only the completion flag. Returns `None` if the task does not exist.
pub async fn set_todo_status(
    pool: &SqlitePool,
    id: i64,
    completed: bool,
) -> Result<Option<TodoItem>, sqlx::Error> {
    let affected = sqlx::query("UPDATE todo_items SET completed = ?1 WHERE id = ?2")
        .bind(completed)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Ok(None);
    }
    get_todo(pool, id).await
}

pub async fn delete_todo(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let affected = sqlx::query("DELETE FROM todo_items WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}

pub async fn todo_stats(pool: &SqlitePool) -> Result<TodoStats, sqlx::Error> {
    let (total, completed): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM todo_items",
    )
    .fetch_one(pool)
    .await?;

    Ok(TodoStats {
        total,
        completed,
        incomplete: total - completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLinkStore;

    #[test]
    fn database_dir_from_url() {
        assert_eq!(
            database_dir("sqlite:./data/shortlist.db"),
            Some(Path::new("./data"))
        );
        assert_eq!(
            database_dir("sqlite:///var/lib/app/db.sqlite?mode=rwc"),
            Some(Path::new("/var/lib/app"))
        );
        assert_eq!(database_dir("sqlite:shortlist.db"), None);
        assert_eq!(database_dir("sqlite::memory:"), None);
        assert_eq!(database_dir("postgres://x"), None);
    }

    #[tokio::test]
    async fn warm_cache_loads_every_link() {
        let store = InMemoryLinkStore::new();
        store.insert("abc123", "https://a.com/").await.unwrap();
        store.insert("def456", "https://b.com/").await.unwrap();

        let cache = LinkCache::new();
        warm_cache(&store, &cache).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("def456").as_deref(), Some("https://b.com/"));
    }

    #[tokio::test]
    async fn todo_crud() {
        let pool = connect_in_memory().await.unwrap();

        let item = create_todo(&pool, "write docs", Some("README"), false)
            .await
            .unwrap();
        assert_eq!(item.title, "write docs");
        assert_eq!(item.description.as_deref(), Some("README"));
        assert!(!item.completed);

        let fetched = get_todo(&pool, item.id).await.unwrap().unwrap();
        assert_eq!(fetched, item);

        let updated = update_todo(&pool, item.id, "write more docs", None, true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "write more docs");
        assert_eq!(updated.description, None);
        assert!(updated.completed);

        let reopened = set_todo_status(&pool, item.id, false)
            .await
            .unwrap()
            .unwrap();
        assert!(!reopened.completed);
        assert_eq!(reopened.title, "write more docs");

        assert!(delete_todo(&pool, item.id).await.unwrap());
        assert!(!delete_todo(&pool, item.id).await.unwrap());
        assert!(get_todo(&pool, item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn todo_missing_rows() {
        let pool = connect_in_memory().await.unwrap();

        assert!(update_todo(&pool, 99, "x", None, false)
            .await
            .unwrap()
            .is_none());
        assert!(set_todo_status(&pool, 99, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn todo_list_and_stats() {
        let pool = connect_in_memory().await.unwrap();

        let empty = todo_stats(&pool).await.unwrap();
        assert_eq!(
            empty,
            TodoStats {
                total: 0,
                completed: 0,
                incomplete: 0
            }
        );

        create_todo(&pool, "a", None, true).await.unwrap();
        create_todo(&pool, "b", None, false).await.unwrap();
        create_todo(&pool, "c", None, false).await.unwrap();

        let titles: Vec<String> = list_todos(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["a", "b", "c"]);

        let stats = todo_stats(&pool).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.incomplete, 2);
    }
}
