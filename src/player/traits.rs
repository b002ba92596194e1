use std::fmt;
use std::time::Duration;

use super::error::PlayerError;

/// Playback state as the remote daemon reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

/// Identifier of a song inside the current playlist.
///
/// Unique within one playlist version; carries no other meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u32);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Where the current song sits in the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongPlace {
    /// Zero-based position in the playlist.
    pub index: u32,
    pub id: RowId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub state: PlaybackState,
    /// Absent while stopped with nothing queued.
    pub song: Option<SongPlace>,
    pub elapsed: Option<Duration>,
    pub duration: Option<Duration>,
    pub playlist_version: u32,
}

/// The song the daemon is currently on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurrentTrack {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// File path relative to the daemon's music directory.
    pub file: String,
    pub duration: Option<Duration>,
}

/// One entry of the remote playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub id: RowId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub file: String,
    pub duration: Option<Duration>,
}

/// A single playlist edit inside a batched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistOp {
    Move { id: RowId, to: u32 },
    Delete { id: RowId },
}

/// An established connection to the remote player.
///
/// Every call is synchronous and may fail.
pub trait PlayerClient: Send {
    fn status(&mut self) -> Result<Status, PlayerError>;
    fn current_track(&mut self) -> Result<Option<CurrentTrack>, PlayerError>;
    fn next(&mut self) -> Result<(), PlayerError>;
    fn previous(&mut self) -> Result<(), PlayerError>;
    fn stop(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self, pause: bool) -> Result<(), PlayerError>;
    /// Start playback from the current (or first) song.
    fn play(&mut self) -> Result<(), PlayerError>;
    fn play_by_id(&mut self, id: RowId) -> Result<(), PlayerError>;
    fn seek(&mut self, song_index: u32, seconds: u32) -> Result<(), PlayerError>;
    fn playlist(&mut self) -> Result<Vec<TrackRow>, PlayerError>;
    fn batch(&mut self, ops: &[PlaylistOp]) -> Result<(), PlayerError>;
    fn clear(&mut self) -> Result<(), PlayerError>;
    fn close(self) -> Result<(), PlayerError>
    where
        Self: Sized;
}

/// Opens connections to a remote player.
pub trait Connector: Send {
    type Client: PlayerClient;

    fn connect(&mut self) -> Result<Self::Client, PlayerError>;
}
