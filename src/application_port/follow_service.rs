use crate::domain_model::*;
use crate::domain_port::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum FollowError {
    #[error("cannot follow yourself")]
    SelfFollow,
    #[error("user not found")]
    UserNotFound,
    #[error("already following")]
    AlreadyFollowing,
    #[error("not following")]
    NotFollowing,
    #[error("store error: {0}")]
    Store(String),
}

impl From<RepoError> for FollowError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::Duplicate => FollowError::AlreadyFollowing,
            other => FollowError::Store(other.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait FollowService: Send + Sync {
    /// Returns the followee so callers can address them by name.
    async fn follow(&self, me: UserId, other: UserId) -> Result<UserSummary, FollowError>;
    async fn unfollow(&self, me: UserId, other: UserId) -> Result<(), FollowError>;
    async fn following(&self, me: UserId) -> Result<Vec<UserId>, FollowError>;
}
