use super::coordinator::{DEFAULT_REFRESH_TIMEOUT, RefreshCoordinator};
use super::error::ClientError;
use super::persistence::SessionPersistence;
use super::redirect::LoginRedirect;
use super::session::SessionStore;
use super::transport::{ApiRequest, HttpTransport, ReqwestTransport};
use crate::domain_model::*;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub refresh_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }
}

#[derive(Deserialize)]
struct TokenBody {
    token: AccessToken,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// Typed calls against the feed API. Every authenticated call goes through
/// the refresh coordinator; credential calls bypass it.
#[derive(Clone)]
pub struct FeedClient {
    coordinator: RefreshCoordinator,
}

impl FeedClient {
    pub fn new(coordinator: RefreshCoordinator) -> Self {
        FeedClient { coordinator }
    }

    pub fn connect(
        config: &ClientConfig,
        persistence: Arc<dyn SessionPersistence>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ClientError> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config.base_url)?);
        let session = Arc::new(SessionStore::new(persistence));
        Ok(Self::new(RefreshCoordinator::new(
            transport,
            session,
            redirect,
            config.refresh_timeout,
        )))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.coordinator.session()
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<UserSummary, ClientError> {
        let request = ApiRequest::post("/api/register")
            .with_json(json!({ "username": username, "password": password }))
            .public();
        self.coordinator.execute(request).await?.into_result()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let request = ApiRequest::post("/api/login")
            .with_json(json!({ "username": username, "password": password }))
            .public();
        let body: TokenBody = self.coordinator.execute(request).await?.into_result()?;
        self.session().set(body.token).await;
        Ok(())
    }

    /// Forget the access token and the refresh cookie. There is no server-side logout.
    pub async fn logout(&self) {
        self.session().clear().await;
        self.coordinator.transport().forget_credentials();
    }

    pub async fn create_post(&self, content: &str) -> Result<Post, ClientError> {
        let request = ApiRequest::post("/api/posts").with_json(json!({ "content": content }));
        self.coordinator.execute(request).await?.into_result()
    }

    pub async fn feed(&self, page: u32, limit: u32) -> Result<FeedPage, ClientError> {
        let request = ApiRequest::get("/api/feed")
            .with_query("page", page)
            .with_query("limit", limit);
        self.coordinator.execute(request).await?.into_result()
    }

    pub async fn follow(&self, user: UserId) -> Result<String, ClientError> {
        let request = ApiRequest::post(format!("/api/follow/{user}"));
        let body: MessageBody = self.coordinator.execute(request).await?.into_result()?;
        Ok(body.message)
    }

    pub async fn unfollow(&self, user: UserId) -> Result<String, ClientError> {
        let request = ApiRequest::delete(format!("/api/follow/{user}"));
        let body: MessageBody = self.coordinator.execute(request).await?.into_result()?;
        Ok(body.message)
    }

    pub async fn following(&self) -> Result<Vec<UserId>, ClientError> {
        self.coordinator
            .execute(ApiRequest::get("/api/following"))
            .await?
            .into_result()
    }

    pub async fn users(&self) -> Result<Vec<UserSummary>, ClientError> {
        self.coordinator
            .execute(ApiRequest::get("/api/users"))
            .await?
            .into_result()
    }
}
