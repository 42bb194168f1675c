//! Remote API error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote API returned {status} for {path}: {message}")]
    Status {
        status: u16,
        path: String,
        message: String,
    },

    #[error("unexpected response for {path}: {message}")]
    Decode { path: String, message: String },
}

impl RemoteError {
    pub fn status(status: u16, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            path: path.into(),
            message: message.into(),
        }
    }
}
