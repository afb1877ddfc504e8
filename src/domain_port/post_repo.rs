use crate::domain_model::*;
use crate::domain_port::RepoError;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait PostRepo: Send + Sync {
    async fn create(
        &self,
        author: UserId,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Post, RepoError>;

    /// Posts by any of `authors`, newest first (ties broken by id, descending).
    async fn list_by_authors(
        &self,
        authors: &[UserId],
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Post>, RepoError>;
}
