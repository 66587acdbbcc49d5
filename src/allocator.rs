use crate::{
    error::{AllocError, StoreError},
    models::ShortLink,
    shortid::Generator,
    store::LinkStore,
};
use std::sync::Arc;

pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Outcome of a successful [`Allocator::allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    /// A new record was inserted.
    Created(ShortLink),
    /// The target was already mapped; nothing was written.
    Duplicate(ShortLink),
}

impl Allocation {
    pub fn link(&self) -> &ShortLink {
        match self {
            Allocation::Created(link) | Allocation::Duplicate(link) => link,
        }
    }

    pub fn into_link(self) -> ShortLink {
        match self {
            Allocation::Created(link) | Allocation::Duplicate(link) => link,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Allocation::Created(_))
    }
}

/// Hands out short ids for target URLs.
///
/// Deduplicates by target first, then draws at most `max_attempts`
/// candidates from the generator until one is free in the store.
#[derive(Clone)]
pub struct Allocator {
    store: Arc<dyn LinkStore>,
    generator: Arc<dyn Generator>,
    max_attempts: usize,
}

impl Allocator {
    pub fn new(store: Arc<dyn LinkStore>, generator: Arc<dyn Generator>) -> Self {
        Self {
            store,
            generator,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn allocate(&self, target_url: &str) -> Result<Allocation, AllocError> {
        if let Some(existing) = self.store.find_by_target(target_url).await? {
            tracing::debug!(short_id = %existing.short_id, "Target already shortened");
            return Ok(Allocation::Duplicate(existing));
        }

        for attempt in 1..=self.max_attempts {
            let candidate = self.generator.generate();

            if candidate.is_reserved() {
                tracing::debug!(%candidate, attempt, "Short id shadowed by a static route");
                continue;
            }

            if self.store.find_by_id(candidate.as_str()).await?.is_some() {
                tracing::debug!(%candidate, attempt, "Short id collision");
                continue;
            }

            // The store re-checks both keys atomically; a concurrent
            // allocation may have claimed either since the reads above.
            match self.store.insert(candidate.as_str(), target_url).await {
                Ok(link) => {
                    tracing::info!(short_id = %link.short_id, attempt, "Short link created");
                    return Ok(Allocation::Created(link));
                }
                Err(StoreError::AlreadyExists(_)) => {
                    tracing::debug!(%candidate, attempt, "Short id claimed concurrently");
                }
                Err(StoreError::TargetExists(existing)) => {
                    tracing::debug!(short_id = %existing.short_id, "Target shortened concurrently");
                    return Ok(Allocation::Duplicate(existing));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AllocError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
