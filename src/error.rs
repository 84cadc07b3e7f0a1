//! Error types for tempmail-proxy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No bearer credential could be resolved for a message operation.
    #[error("No Auth Token Provided.")]
    Unauthorized,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An inbox operation was attempted before any mailbox was generated.
    #[error("Please generate an email first.")]
    NoSession,

    #[error("{0} not found")]
    NotFound(String),

    /// The proxy answered with a non-success status.
    #[error("Proxy returned {status}: {message}")]
    Proxy { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
