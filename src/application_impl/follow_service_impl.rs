use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{Clock, FollowRepo, UserRepo};
use std::sync::Arc;

pub struct RealFollowService {
    user_repo: Arc<dyn UserRepo>,
    follow_repo: Arc<dyn FollowRepo>,
    clock: Arc<dyn Clock>,
}

impl RealFollowService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        follow_repo: Arc<dyn FollowRepo>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        RealFollowService {
            user_repo,
            follow_repo,
            clock,
        }
    }
}

#[async_trait::async_trait]
impl FollowService for RealFollowService {
    async fn follow(&self, me: UserId, other: UserId) -> Result<UserSummary, FollowError> {
        if me == other {
            return Err(FollowError::SelfFollow);
        }

        let followee = self
            .user_repo
            .find_by_id(other)
            .await?
            .ok_or(FollowError::UserNotFound)?;

        self.follow_repo
            .insert(me, other, self.clock.now())
            .await?;
        Ok(followee)
    }

    async fn unfollow(&self, me: UserId, other: UserId) -> Result<(), FollowError> {
        if !self.follow_repo.delete(me, other).await? {
            return Err(FollowError::NotFollowing);
        }
        Ok(())
    }

    async fn following(&self, me: UserId) -> Result<Vec<UserId>, FollowError> {
        Ok(self.follow_repo.list_followees(me).await?)
    }
}
