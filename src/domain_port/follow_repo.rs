use crate::domain_model::*;
use crate::domain_port::RepoError;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait FollowRepo: Send + Sync {
    /// Fails with [`RepoError::Duplicate`] when the edge already exists.
    async fn insert(
        &self,
        follower: UserId,
        followee: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepoError>;

    /// Returns whether an edge was removed.
    async fn delete(&self, follower: UserId, followee: UserId) -> Result<bool, RepoError>;

    async fn list_followees(&self, follower: UserId) -> Result<Vec<UserId>, RepoError>;
}
