use crate::api::RefreshCookiePolicy;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

const ACCESS_SECRET_VAR: &str = "JWT_SECRET";
const REFRESH_SECRET_VAR: &str = "REFRESH_TOKEN_SECRET";

/// Storage ports the services are built on.
pub struct Repos {
    pub user_repo: Arc<dyn UserRepo>,
    pub post_repo: Arc<dyn PostRepo>,
    pub follow_repo: Arc<dyn FollowRepo>,
}

impl Repos {
    pub fn in_memory() -> Self {
        Repos {
            user_repo: Arc::new(MemoryUserRepo::new()),
            post_repo: Arc::new(MemoryPostRepo::new()),
            follow_repo: Arc::new(MemoryFollowRepo::new()),
        }
    }

    pub fn mysql(pool: Pool<MySql>) -> Self {
        Repos {
            user_repo: Arc::new(MySqlUserRepo::new(pool.clone())),
            post_repo: Arc::new(MySqlPostRepo::new(pool.clone())),
            follow_repo: Arc::new(MySqlFollowRepo::new(pool)),
        }
    }
}

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub post_service: Arc<dyn PostService>,
    pub follow_service: Arc<dyn FollowService>,
    pub user_service: Arc<dyn UserService>,
    pub cookie_policy: Arc<RefreshCookiePolicy>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let jwt_config = JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            access_secret: load_secret(ACCESS_SECRET_VAR, "feedline-dev-access-secret")?,
            refresh_secret: load_secret(REFRESH_SECRET_VAR, "feedline-dev-refresh-secret")?,
        };
        if jwt_config.access_secret == jwt_config.refresh_secret {
            return Err(anyhow::anyhow!(
                "{} and {} must differ",
                ACCESS_SECRET_VAR,
                REFRESH_SECRET_VAR
            ));
        }

        let (repos, pool) = match settings.storage.backend.as_str() {
            "memory" => (Repos::in_memory(), None),
            "mysql" => {
                let dsn = settings
                    .storage
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("storage.mysql_dsn is required"))?;
                let pool = Pool::<MySql>::connect(dsn).await?;
                if settings.storage.bootstrap_schema {
                    bootstrap_schema(&pool).await?;
                    info!("schema bootstrapped");
                }
                (Repos::mysql(pool.clone()), Some(pool))
            }
            other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        };

        let mut server = Self::assemble(repos, jwt_config, clock, settings.http.secure_cookie);
        server.pool = pool;

        info!(backend = %settings.storage.backend, "server started");
        Ok(server)
    }

    /// Wire services over the given repos. No I/O happens here.
    pub fn assemble(
        repos: Repos,
        jwt_config: JwtConfig,
        clock: Arc<dyn Clock>,
        secure_cookie: bool,
    ) -> Self {
        let cookie_policy = Arc::new(RefreshCookiePolicy {
            secure: secure_cookie,
            max_age: jwt_config.refresh_ttl,
        });

        let token_issuer: Arc<dyn TokenIssuer> =
            Arc::new(JwtTokenIssuer::new(jwt_config, clock.clone()));
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            repos.user_repo.clone(),
            credential_hasher,
            token_issuer,
            clock.clone(),
        ));
        let post_service: Arc<dyn PostService> = Arc::new(RealPostService::new(
            repos.post_repo.clone(),
            repos.follow_repo.clone(),
            clock.clone(),
        ));
        let follow_service: Arc<dyn FollowService> = Arc::new(RealFollowService::new(
            repos.user_repo.clone(),
            repos.follow_repo.clone(),
            clock,
        ));
        let user_service: Arc<dyn UserService> =
            Arc::new(RealUserService::new(repos.user_repo.clone()));

        Self {
            auth_service,
            post_service,
            follow_service,
            user_service,
            cookie_policy,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

fn load_secret(var: &str, dev_fallback: &str) -> anyhow::Result<Vec<u8>> {
    match std::env::var(var) {
        Ok(secret) if !secret.is_empty() => Ok(secret.into_bytes()),
        _ if cfg!(debug_assertions) => {
            warn!("{} not set, using a development secret", var);
            Ok(dev_fallback.as_bytes().to_vec())
        }
        _ => Err(anyhow::anyhow!("{} must be set", var)),
    }
}
