use super::util::{db_timestamp, store_err};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

pub struct MySqlPostRepo {
    pool: MySqlPool,
}

impl MySqlPostRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPostRepo { pool }
    }

    fn row_to_post(row: MySqlRow) -> Result<Post, RepoError> {
        Ok(Post {
            id: row.try_get("id").map_err(store_err)?,
            user_id: row.try_get("user_id").map_err(store_err)?,
            content: row.try_get("content").map_err(store_err)?,
            created_at: row.try_get("created_at").map_err(store_err)?,
        })
    }
}

#[async_trait::async_trait]
impl PostRepo for MySqlPostRepo {
    async fn create(
        &self,
        author: UserId,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let created_at = db_timestamp(created_at);
        let result = sqlx::query(
            r#"
INSERT INTO posts (user_id, content, created_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(author)
        .bind(content)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|e| RepoError::Store(e.to_string()))?;
        Ok(Post {
            id: PostId(id),
            user_id: author,
            content: content.to_string(),
            created_at,
        })
    }

    async fn list_by_authors(
        &self,
        authors: &[UserId],
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Post>, RepoError> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT id, user_id, content, created_at FROM posts WHERE user_id IN (",
        );
        let mut ids = qb.separated(", ");
        for author in authors {
            ids.push_bind(author.0);
        }
        ids.push_unseparated(") ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(u64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        rows.into_iter().map(Self::row_to_post).collect()
    }
}
