use crate::domain_model::*;
use crate::domain_port::RepoError;

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Everyone except `me`.
    async fn list_users(&self, me: UserId) -> Result<Vec<UserSummary>, RepoError>;
}
