use super::{LinkStore, Result};
use crate::{error::StoreError, models::ShortLink};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Durable [`LinkStore`] over the `short_links` table.
///
/// `short_id` is the primary key and `target_url` carries a unique index, so
/// SQLite itself rejects colliding inserts.
#[derive(Debug, Clone)]
pub struct SqliteLinkStore {
    pool: SqlitePool,
}

impl SqliteLinkStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn find_by_target(&self, url: &str) -> Result<Option<ShortLink>> {
        let link: Option<ShortLink> = sqlx::query_as(
            "SELECT short_id, target_url, created_at
             FROM short_links WHERE target_url = ?1
             ORDER BY rowid LIMIT 1",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    async fn find_by_id(&self, short_id: &str) -> Result<Option<ShortLink>> {
        let link: Option<ShortLink> = sqlx::query_as(
            "SELECT short_id, target_url, created_at
             FROM short_links WHERE short_id = ?1",
        )
        .bind(short_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    async fn insert(&self, short_id: &str, url: &str) -> Result<ShortLink> {
        let inserted = sqlx::query("INSERT INTO short_links (short_id, target_url) VALUES (?1, ?2)")
            .bind(short_id)
            .bind(url)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                // Either key may have collided; the target index wins.
                return match self.find_by_target(url).await? {
                    Some(existing) => Err(StoreError::TargetExists(existing)),
                    None => Err(StoreError::AlreadyExists(short_id.to_owned())),
                };
            }
            Err(e) => return Err(e.into()),
        }

        let link: ShortLink = sqlx::query_as(
            "SELECT short_id, target_url, created_at
             FROM short_links WHERE short_id = ?1",
        )
        .bind(short_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(link)
    }

    async fn delete_by_id(&self, short_id: &str) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM short_links WHERE short_id = ?1")
            .bind(short_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn list_all(&self) -> Result<Vec<ShortLink>> {
        let links: Vec<ShortLink> = sqlx::query_as(
            "SELECT short_id, target_url, created_at
             FROM short_links ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }
}
