use crate::domain_model::*;
use crate::domain_port::RepoError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserCredentialsRecord {
    pub user_id: UserId,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user. Fails with [`RepoError::Duplicate`] when the username is taken.
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserSummary, RepoError>;

    /// Fetch credentials by username (for login).
    async fn find_credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentialsRecord>, RepoError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserSummary>, RepoError>;

    /// Every user except `excluded`, ordered by id.
    async fn list_except(&self, excluded: UserId) -> Result<Vec<UserSummary>, RepoError>;
}
