#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique key (username, follow edge) already exists.
    #[error("duplicate key")]
    Duplicate,
    #[error("row not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(String),
}
