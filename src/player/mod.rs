pub mod error;
pub mod memory;
#[cfg(feature = "mpd")]
pub mod mpd;
pub mod traits;

pub use error::PlayerError;
pub use memory::MemoryPlayer;
#[cfg(feature = "mpd")]
pub use self::mpd::MpdConnector;
pub use traits::{
    Connector, CurrentTrack, PlaybackState, PlayerClient, PlaylistOp, RowId, SongPlace, Status,
    TrackRow,
};
