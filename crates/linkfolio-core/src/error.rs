use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The event store could not answer a query (network, lock, disk).
    #[error("fetch failed: {0}")]
    FetchFailure(String),

    #[error("session expired")]
    SessionExpired,

    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("unknown social platform: {0}")]
    UnknownSocialPlatform(String),
}
