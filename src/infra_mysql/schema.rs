use sqlx::MySqlPool;

const SCHEMA: &str = include_str!("schema.sql");

/// Create the tables if they are missing. Idempotent.
pub async fn bootstrap_schema(pool: &MySqlPool) -> anyhow::Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
