use super::util::store_err;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

pub struct MySqlFollowRepo {
    pool: MySqlPool,
}

impl MySqlFollowRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlFollowRepo { pool }
    }
}

#[async_trait::async_trait]
impl FollowRepo for MySqlFollowRepo {
    async fn insert(
        &self,
        follower: UserId,
        followee: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
INSERT INTO follows (follower_id, followee_id, created_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(follower)
        .bind(followee)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn delete(&self, follower: UserId, followee: UserId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower)
            .bind(followee)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_followees(&self, follower: UserId) -> Result<Vec<UserId>, RepoError> {
        let ids: Vec<UserId> = sqlx::query_scalar(
            r#"
SELECT followee_id
FROM follows
WHERE follower_id = ?
ORDER BY created_at, followee_id
"#,
        )
        .bind(follower)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(ids)
    }
}
