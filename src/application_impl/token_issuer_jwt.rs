use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::Clock;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id as string
    username: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
}

/// HS256 issuer with one secret per token class.
///
/// Expiry is checked here against the injected [`Clock`] with zero leeway,
/// so a token is accepted up to and including its `exp` second.
pub struct JwtTokenIssuer {
    cfg: JwtConfig,
    clock: Arc<dyn Clock>,
}

impl JwtTokenIssuer {
    pub fn new(cfg: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        JwtTokenIssuer { cfg, clock }
    }

    fn secret(&self, class: TokenClass) -> &[u8] {
        match class {
            TokenClass::Access => &self.cfg.access_secret,
            TokenClass::Refresh => &self.cfg.refresh_secret,
        }
    }

    fn ttl(&self, class: TokenClass) -> Duration {
        match class {
            TokenClass::Access => self.cfg.access_ttl,
            TokenClass::Refresh => self.cfg.refresh_ttl,
        }
    }

    fn encode_claims(
        &self,
        subject: &Principal,
        class: TokenClass,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let iat = self.clock.now().timestamp();
        let ttl = i64::try_from(self.ttl(class).as_secs())
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let exp = iat + ttl;
        let exp_dt = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::InternalError("expiry out of range".to_string()))?;

        let claims = Claims {
            sub: subject.user_id.to_string(),
            username: subject.username.clone(),
            exp,
            iat,
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret(class)),
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok((token, exp_dt))
    }

    fn decode_claims(&self, token: &str, class: TokenClass) -> Result<Claims, AuthError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = false;
        v.leeway = 0;
        v.set_audience(&[self.cfg.audience.as_str()]);
        v.set_issuer(&[self.cfg.issuer.as_str()]);
        v.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.secret(class)), &v)
            .map_err(|_| AuthError::TokenInvalid)?;

        if self.clock.now().timestamp() > data.claims.exp {
            return Err(AuthError::TokenInvalid);
        }
        Ok(data.claims)
    }
}

#[async_trait::async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn issue(&self, subject: &Principal) -> Result<IssuedTokens, AuthError> {
        let (access, access_exp) = self.encode_claims(subject, TokenClass::Access)?;
        let (refresh, refresh_exp) = self.encode_claims(subject, TokenClass::Refresh)?;
        Ok(IssuedTokens {
            access_token: AccessToken(access),
            refresh_token: RefreshToken(refresh),
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    async fn verify(&self, token: &str, class: TokenClass) -> Result<Principal, AuthError> {
        let claims = self.decode_claims(token, class)?;
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenInvalid)?;
        Ok(Principal {
            user_id,
            username: claims.username,
        })
    }

    async fn rotate(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let subject = self.verify(&refresh_token.0, TokenClass::Refresh).await?;
        let (access, access_exp) = self.encode_claims(&subject, TokenClass::Access)?;
        Ok((AccessToken(access), access_exp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::ManualClock;

    fn test_config() -> JwtConfig {
        JwtConfig {
            issuer: "feedline-test".into(),
            audience: "feedline-test-client".into(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            access_secret: b"access-secret-for-tests".to_vec(),
            refresh_secret: b"refresh-secret-for-tests".to_vec(),
        }
    }

    fn issuer() -> (JwtTokenIssuer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (JwtTokenIssuer::new(test_config(), clock.clone()), clock)
    }

    fn alice() -> Principal {
        Principal {
            user_id: UserId(7),
            username: "alice".into(),
        }
    }

    #[tokio::test]
    async fn issued_pair_verifies_under_its_own_class() {
        let (issuer, _) = issuer();
        let tokens = issuer.issue(&alice()).await.unwrap();

        let from_access = issuer
            .verify(&tokens.access_token.0, TokenClass::Access)
            .await
            .unwrap();
        let from_refresh = issuer
            .verify(&tokens.refresh_token.0, TokenClass::Refresh)
            .await
            .unwrap();

        assert_eq!(from_access, alice());
        assert_eq!(from_refresh, alice());
        assert!(tokens.refresh_token_expires_at > tokens.access_token_expires_at);
    }

    #[tokio::test]
    async fn access_token_valid_through_ttl_then_rejected() {
        let (issuer, clock) = issuer();
        let tokens = issuer.issue(&alice()).await.unwrap();

        clock.advance(chrono::Duration::minutes(15));
        assert!(
            issuer
                .verify(&tokens.access_token.0, TokenClass::Access)
                .await
                .is_ok()
        );

        clock.advance(chrono::Duration::seconds(1));
        assert!(matches!(
            issuer
                .verify(&tokens.access_token.0, TokenClass::Access)
                .await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn token_classes_do_not_cross() {
        let (issuer, _) = issuer();
        let tokens = issuer.issue(&alice()).await.unwrap();

        assert!(matches!(
            issuer
                .verify(&tokens.refresh_token.0, TokenClass::Access)
                .await,
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            issuer
                .verify(&tokens.access_token.0, TokenClass::Refresh)
                .await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn malformed_and_tampered_tokens_are_invalid() {
        let (issuer, _) = issuer();
        let tokens = issuer.issue(&alice()).await.unwrap();
        let bob = Principal {
            user_id: UserId(8),
            username: "bob".into(),
        };
        let other = issuer.issue(&bob).await.unwrap();

        // alice's claims under bob's signature
        let (claims, _) = tokens.access_token.0.rsplit_once('.').unwrap();
        let (_, signature) = other.access_token.0.rsplit_once('.').unwrap();
        let tampered = format!("{claims}.{signature}");

        for bad in ["", "not-a-jwt", "a.b.c", tampered.as_str()] {
            assert!(matches!(
                issuer.verify(bad, TokenClass::Access).await,
                Err(AuthError::TokenInvalid)
            ));
        }
    }

    #[tokio::test]
    async fn foreign_issuer_is_rejected() {
        let (issuer, clock) = issuer();
        let mut cfg = test_config();
        cfg.issuer = "someone-else".into();
        let foreign = JwtTokenIssuer::new(cfg, clock);

        let tokens = foreign.issue(&alice()).await.unwrap();
        assert!(
            issuer
                .verify(&tokens.access_token.0, TokenClass::Access)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn rotate_mints_fresh_access_token_for_same_subject() {
        let (issuer, clock) = issuer();
        let tokens = issuer.issue(&alice()).await.unwrap();

        clock.advance(chrono::Duration::minutes(16));
        assert!(
            issuer
                .verify(&tokens.access_token.0, TokenClass::Access)
                .await
                .is_err()
        );

        let (rotated, expires_at) = issuer.rotate(&tokens.refresh_token).await.unwrap();
        assert_ne!(rotated, tokens.access_token);
        assert_eq!(expires_at, clock.now() + chrono::Duration::minutes(15));
        assert_eq!(
            issuer.verify(&rotated.0, TokenClass::Access).await.unwrap(),
            alice()
        );
        // the refresh token is not consumed
        assert!(issuer.rotate(&tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn rotate_rejects_access_token_and_expired_refresh_token() {
        let (issuer, clock) = issuer();
        let tokens = issuer.issue(&alice()).await.unwrap();

        let as_refresh = RefreshToken(tokens.access_token.0.clone());
        assert!(issuer.rotate(&as_refresh).await.is_err());

        clock.advance(chrono::Duration::days(7) + chrono::Duration::seconds(1));
        assert!(matches!(
            issuer.rotate(&tokens.refresh_token).await,
            Err(AuthError::TokenInvalid)
        ));
    }
}
