pub mod memory;
pub mod sqlite;

use crate::{error::StoreError, models::ShortLink};
use async_trait::async_trait;

pub use memory::InMemoryLinkStore;
pub use sqlite::SqliteLinkStore;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Owner of every [`ShortLink`] record.
///
/// Implementations must enforce uniqueness of both `short_id` and
/// `target_url` inside `insert`, so two concurrent allocations can never
/// produce colliding records.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Exact match on the target URL.
    async fn find_by_target(&self, url: &str) -> Result<Option<ShortLink>>;

    async fn find_by_id(&self, short_id: &str) -> Result<Option<ShortLink>>;

    /// Inserts a new mapping.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if `short_id` is taken and
    /// with [`StoreError::TargetExists`] if `url` is already mapped.
    async fn insert(&self, short_id: &str, url: &str) -> Result<ShortLink>;

    /// Returns `true` if a record was removed.
    async fn delete_by_id(&self, short_id: &str) -> Result<bool>;

    /// Every record, in insertion order.
    async fn list_all(&self) -> Result<Vec<ShortLink>>;
}
