use thiserror::Error;

/// Failure classes surfaced by the crate. Operations attempt exactly once and
/// propagate these upward without retry or further classification.
#[derive(Debug, Error)]
pub enum Error {
    #[error("upload error: {0}")]
    Upload(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("realtime error: {0}")]
    Realtime(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Log an error with context before rethrowing it. Every domain operation
/// routes failures through here so nothing is silently swallowed.
pub(crate) fn log_err(context: &'static str) -> impl FnOnce(Error) -> Error {
    move |err| {
        log::error!("{context}: {err}");
        err
    }
}
