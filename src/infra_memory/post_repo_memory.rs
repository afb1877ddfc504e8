use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct MemoryPostRepo {
    posts: DashMap<PostId, Post>,
    next_id: AtomicI64,
}

impl MemoryPostRepo {
    pub fn new() -> Self {
        MemoryPostRepo {
            posts: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryPostRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PostRepo for MemoryPostRepo {
    async fn create(
        &self,
        author: UserId,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let post = Post {
            id: PostId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            user_id: author,
            content: content.to_string(),
            created_at,
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn list_by_authors(
        &self,
        authors: &[UserId],
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Post>, RepoError> {
        let authors: HashSet<UserId> = authors.iter().copied().collect();
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| authors.contains(&entry.user_id))
            .map(|entry| entry.value().clone())
            .collect();
        posts.sort_by_key(|p| Reverse((p.created_at, p.id)));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(posts
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect())
    }
}
