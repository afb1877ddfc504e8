use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};

/// Follow edges keyed by `(follower, followee)`; the value keeps insertion order.
pub struct MemoryFollowRepo {
    edges: DashMap<(UserId, UserId), (DateTime<Utc>, u64)>,
    seq: AtomicU64,
}

impl MemoryFollowRepo {
    pub fn new() -> Self {
        MemoryFollowRepo {
            edges: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryFollowRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FollowRepo for MemoryFollowRepo {
    async fn insert(
        &self,
        follower: UserId,
        followee: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        match self.edges.entry((follower, followee)) {
            Entry::Occupied(_) => Err(RepoError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert((created_at, self.seq.fetch_add(1, Ordering::SeqCst)));
                Ok(())
            }
        }
    }

    async fn delete(&self, follower: UserId, followee: UserId) -> Result<bool, RepoError> {
        Ok(self.edges.remove(&(follower, followee)).is_some())
    }

    async fn list_followees(&self, follower: UserId) -> Result<Vec<UserId>, RepoError> {
        let mut edges: Vec<(u64, UserId)> = self
            .edges
            .iter()
            .filter(|entry| entry.key().0 == follower)
            .map(|entry| (entry.value().1, entry.key().1))
            .collect();
        edges.sort_unstable();
        Ok(edges.into_iter().map(|(_, followee)| followee).collect())
    }
}
