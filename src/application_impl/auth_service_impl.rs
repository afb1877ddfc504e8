use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{Clock, UserRepo};
use crate::logger::*;
use std::sync::Arc;

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_issuer: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_issuer,
            clock,
        }
    }

    fn require_credentials(username: &str, password: &str) -> Result<(), AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, request: RegisterInput) -> Result<UserSummary, AuthError> {
        let RegisterInput { username, password } = request;
        Self::require_credentials(&username, &password)?;
        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(AuthError::UsernameTooLong {
                max: MAX_USERNAME_CHARS,
            });
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = self
            .user_repo
            .create(&username, &password_hash, self.clock.now())
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    async fn login(&self, request: LoginInput) -> Result<IssuedTokens, AuthError> {
        let LoginInput { username, password } = request;
        Self::require_credentials(&username, &password)?;

        let rec = self
            .user_repo
            .find_credentials_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let principal = Principal {
            user_id: rec.user_id,
            username: rec.username.clone(),
        };
        let tokens = self.token_issuer.issue(&principal).await?;

        debug!(user_id = %rec.user_id, "login succeeded");
        Ok(tokens)
    }

    async fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        self.token_issuer.verify(token, TokenClass::Access).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let (access_token, _expires_at) = self
            .token_issuer
            .rotate(&RefreshToken(refresh_token.to_string()))
            .await?;
        Ok(access_token)
    }
}
