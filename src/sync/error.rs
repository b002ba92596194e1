use crate::player::PlayerError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    /// Connecting or querying status failed; the connection is treated as lost.
    #[error("connection lost: {0}")]
    Connectivity(#[source] PlayerError),

    /// A remote call failed; the engine keeps its previous state.
    #[error("{op} failed: {source}")]
    Command {
        op: &'static str,
        #[source]
        source: PlayerError,
    },

    /// A value reported by the player could not be turned into something usable.
    #[error("bad value from player: {0}")]
    Conversion(String),
}

impl SyncError {
    pub fn command(op: &'static str) -> impl FnOnce(PlayerError) -> SyncError {
        move |source| SyncError::Command { op, source }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, SyncError::Connectivity(_))
    }
}

/// The single reporting channel for everything that goes wrong in the loop.
pub fn report(origin: &str, err: &SyncError) {
    match err {
        SyncError::Conversion(_) => warn!(origin, "{}", err),
        _ => error!(origin, "{}", err),
    }
}
