use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[cfg(feature = "mpd")]
    #[error(transparent)]
    Mpd(#[from] ::mpd::error::Error),
}
