use super::util::store_err;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_summary(row: MySqlRow) -> Result<UserSummary, RepoError> {
        Ok(UserSummary {
            id: row.try_get("id").map_err(store_err)?,
            username: row.try_get("username").map_err(store_err)?,
        })
    }

    fn row_to_credentials(row: MySqlRow) -> Result<UserCredentialsRecord, RepoError> {
        Ok(UserCredentialsRecord {
            user_id: row.try_get("id").map_err(store_err)?,
            username: row.try_get("username").map_err(store_err)?,
            password_hash: row.try_get("password_hash").map_err(store_err)?,
            created_at: row.try_get("created_at").map_err(store_err)?,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserSummary, RepoError> {
        let result = sqlx::query(
            r#"
INSERT INTO users (username, password_hash, created_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|e| RepoError::Store(e.to_string()))?;
        Ok(UserSummary {
            id: UserId(id),
            username: username.to_string(),
        })
    }

    async fn find_credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentialsRecord>, RepoError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, username, password_hash, created_at
FROM users
WHERE username = ?
"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_credentials).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserSummary>, RepoError> {
        let row_opt = sqlx::query("SELECT id, username FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row_opt.map(Self::row_to_summary).transpose()
    }

    async fn list_except(&self, excluded: UserId) -> Result<Vec<UserSummary>, RepoError> {
        let rows = sqlx::query("SELECT id, username FROM users WHERE id <> ? ORDER BY id")
            .bind(excluded)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        rows.into_iter().map(Self::row_to_summary).collect()
    }
}
