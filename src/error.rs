/// error.rs — Typed failures of the two external collaborators
///
/// Feed errors are per-symbol and never fatal to a tick; storage errors abort
/// only the write step they occur in. Insufficient indicator data is not an
/// error (the detector returns no signal), and a duplicate signal is an
/// expected `false` from the dedup ledger, not an error either.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("exchange returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed exchange payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("row serialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}
