use super::{LinkStore, Result};
use crate::{error::StoreError, models::ShortLink};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    link: ShortLink,
}

/// Non-durable [`LinkStore`] backed by two `DashMap`s.
///
/// Lock order is always `links` then `targets`; readers that need both copy
/// the key out of `targets` and drop the guard before touching `links`.
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    links: DashMap<String, Slot>,
    targets: DashMap<String, String>,
    next_seq: AtomicU64,
}

impl InMemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn find_by_target(&self, url: &str) -> Result<Option<ShortLink>> {
        let Some(short_id) = self.targets.get(url).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.links.get(&short_id).map(|slot| slot.link.clone()))
    }

    async fn find_by_id(&self, short_id: &str) -> Result<Option<ShortLink>> {
        Ok(self.links.get(short_id).map(|slot| slot.link.clone()))
    }

    async fn insert(&self, short_id: &str, url: &str) -> Result<ShortLink> {
        let owner = match self.links.entry(short_id.to_owned()) {
            Entry::Occupied(_) => return Err(StoreError::AlreadyExists(short_id.to_owned())),
            Entry::Vacant(vacant) => match self.targets.entry(url.to_owned()) {
                Entry::Occupied(owner) => owner.get().clone(),
                Entry::Vacant(target) => {
                    let link = ShortLink {
                        short_id: short_id.to_owned(),
                        target_url: url.to_owned(),
                        created_at: chrono::Utc::now().naive_utc(),
                    };
                    target.insert(short_id.to_owned());
                    vacant.insert(Slot {
                        seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                        link: link.clone(),
                    });
                    return Ok(link);
                }
            },
        };

        // Both entry guards are released here; `owner` may live in the same
        // shard as `short_id`.
        match self.links.get(&owner).map(|slot| slot.link.clone()) {
            Some(link) => Err(StoreError::TargetExists(link)),
            // Owner is mid-delete; its target entry goes away next.
            None => Err(StoreError::AlreadyExists(owner)),
        }
    }

    async fn delete_by_id(&self, short_id: &str) -> Result<bool> {
        let Some((_, slot)) = self.links.remove(short_id) else {
            return Ok(false);
        };
        self.targets
            .remove_if(&slot.link.target_url, |_, owner| owner == short_id);
        Ok(true)
    }

    async fn list_all(&self) -> Result<Vec<ShortLink>> {
        let mut slots: Vec<Slot> = self.links.iter().map(|e| e.value().clone()).collect();
        slots.sort_by_key(|slot| slot.seq);
        Ok(slots.into_iter().map(|slot| slot.link).collect())
    }
}
