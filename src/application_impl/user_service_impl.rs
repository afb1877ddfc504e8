use crate::application_port::UserService;
use crate::domain_model::{UserId, UserSummary};
use crate::domain_port::{RepoError, UserRepo};
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>) -> RealUserService {
        RealUserService { user_repo }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn list_users(&self, me: UserId) -> Result<Vec<UserSummary>, RepoError> {
        self.user_repo.list_except(me).await
    }
}
