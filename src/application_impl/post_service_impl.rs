use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{Clock, FollowRepo, PostRepo};
use std::sync::Arc;

pub struct RealPostService {
    post_repo: Arc<dyn PostRepo>,
    follow_repo: Arc<dyn FollowRepo>,
    clock: Arc<dyn Clock>,
}

impl RealPostService {
    pub fn new(
        post_repo: Arc<dyn PostRepo>,
        follow_repo: Arc<dyn FollowRepo>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        RealPostService {
            post_repo,
            follow_repo,
            clock,
        }
    }
}

#[async_trait::async_trait]
impl PostService for RealPostService {
    async fn create_post(&self, author: UserId, content: &str) -> Result<Post, PostError> {
        if content.is_empty() {
            return Err(PostError::EmptyContent);
        }
        if content.chars().count() > MAX_POST_CHARS {
            return Err(PostError::ContentTooLong {
                max: MAX_POST_CHARS,
            });
        }

        let post = self
            .post_repo
            .create(author, content, self.clock.now())
            .await?;
        Ok(post)
    }

    async fn feed(&self, viewer: UserId, page: PageRequest) -> Result<FeedPage, PostError> {
        let followees = self.follow_repo.list_followees(viewer).await?;
        if followees.is_empty() {
            return Ok(FeedPage {
                page: page.page,
                posts: Vec::new(),
            });
        }

        let posts = self
            .post_repo
            .list_by_authors(&followees, page.offset(), page.limit)
            .await?;
        Ok(FeedPage {
            page: page.page,
            posts,
        })
    }
}
