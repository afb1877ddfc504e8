use crate::domain_model::*;
use crate::domain_port::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("content cannot be empty")]
    EmptyContent,
    #[error("content exceeds {max} characters")]
    ContentTooLong { max: usize },
    #[error("store error: {0}")]
    Store(String),
}

impl From<RepoError> for PostError {
    fn from(error: RepoError) -> Self {
        PostError::Store(error.to_string())
    }
}

#[async_trait::async_trait]
pub trait PostService: Send + Sync {
    async fn create_post(&self, author: UserId, content: &str) -> Result<Post, PostError>;
    async fn feed(&self, viewer: UserId, page: PageRequest) -> Result<FeedPage, PostError>;
}
