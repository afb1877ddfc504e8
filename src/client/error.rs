#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    /// A replay with a freshly refreshed token was still rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The refresh attempt failed; the session has been cleared.
    #[error("session expired, please log in again")]
    SessionExpired,
    #[error("refresh call timed out")]
    RefreshTimedOut,
    #[error("retried call timed out")]
    ReplayTimedOut,
    #[error("{status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}
