use crate::domain_model::*;
use crate::domain_port::RepoError;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("username longer than {max} characters")]
    UsernameTooLong { max: usize },
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Malformed, forged and expired tokens all collapse into this one outcome.
    #[error("token invalid")]
    TokenInvalid,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<RepoError> for AuthError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::Duplicate => AuthError::UsernameTaken,
            other => AuthError::Store(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Mint an access/refresh pair for a freshly authenticated principal.
    async fn issue(&self, subject: &Principal) -> Result<IssuedTokens, AuthError>;

    /// Check signature and expiry against the secret of `class`.
    async fn verify(&self, token: &str, class: TokenClass) -> Result<Principal, AuthError>;

    /// Exchange a valid refresh token for a new access token bound to the same subject.
    /// The refresh token itself is neither reissued nor invalidated.
    async fn rotate(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<UserSummary, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<IssuedTokens, AuthError>;
    async fn verify_token(&self, token: &str) -> Result<Principal, AuthError>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<AccessToken, AuthError>;
}
