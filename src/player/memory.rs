//! An in-process remote player.
//!
//! Backs `--demo` and the test suites. It keeps a playlist, a version
//! counter that moves like MPD's (one bump per queue edit), a log of every
//! call it receives, and a set of operations that should fail on demand.

use super::error::PlayerError;
use super::traits::{
    Connector, CurrentTrack, PlaybackState, PlayerClient, PlaylistOp, RowId, SongPlace, Status,
    TrackRow,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// The kind of a call, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Connect,
    Status,
    CurrentTrack,
    Next,
    Previous,
    Stop,
    Pause,
    Play,
    PlayById,
    Seek,
    Playlist,
    Batch,
    Clear,
    Close,
}

/// One call as the player received it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Status,
    CurrentTrack,
    Next,
    Previous,
    Stop,
    Pause(bool),
    Play,
    PlayById(RowId),
    Seek { index: u32, seconds: u32 },
    Playlist,
    Batch(Vec<PlaylistOp>),
    Clear,
    Close,
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::Connect => CallKind::Connect,
            Call::Status => CallKind::Status,
            Call::CurrentTrack => CallKind::CurrentTrack,
            Call::Next => CallKind::Next,
            Call::Previous => CallKind::Previous,
            Call::Stop => CallKind::Stop,
            Call::Pause(_) => CallKind::Pause,
            Call::Play => CallKind::Play,
            Call::PlayById(_) => CallKind::PlayById,
            Call::Seek { .. } => CallKind::Seek,
            Call::Playlist => CallKind::Playlist,
            Call::Batch(_) => CallKind::Batch,
            Call::Clear => CallKind::Clear,
            Call::Close => CallKind::Close,
        }
    }

    /// True for calls that change playback or the playlist.
    pub fn is_state_changing(&self) -> bool {
        !matches!(
            self,
            Call::Connect | Call::Status | Call::CurrentTrack | Call::Playlist | Call::Close
        )
    }
}

#[derive(Debug)]
struct Daemon {
    state: PlaybackState,
    queue: Vec<TrackRow>,
    current: Option<usize>,
    elapsed: u32,
    version: u32,
    next_id: u32,
    failing: HashSet<CallKind>,
    calls: Vec<Call>,
}

impl Daemon {
    fn record(&mut self, call: Call) -> Result<(), PlayerError> {
        let kind = call.kind();
        self.calls.push(call);
        if self.failing.contains(&kind) {
            return Err(PlayerError::Protocol(format!("{:?} failed", kind)));
        }
        Ok(())
    }

    fn position_of(&self, id: RowId) -> Result<usize, PlayerError> {
        self.queue
            .iter()
            .position(|row| row.id == id)
            .ok_or_else(|| PlayerError::NotFound(format!("song id {}", id)))
    }
}

/// Shared handle to the in-memory daemon. Clones see the same state.
#[derive(Debug, Clone)]
pub struct MemoryPlayer {
    daemon: Arc<Mutex<Daemon>>,
}

impl Default for MemoryPlayer {
    fn default() -> Self {
        Self {
            daemon: Arc::new(Mutex::new(Daemon {
                state: PlaybackState::Stopped,
                queue: Vec::new(),
                current: None,
                elapsed: 0,
                version: 0,
                next_id: 1,
                failing: HashSet::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl MemoryPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A player with a short playlist already queued.
    pub fn demo() -> Self {
        let player = Self::new();
        player.add("Blue in Green", "Miles Davis", "Kind of Blue", "Miles Davis/Kind of Blue/03.flac", 337);
        player.add("So What", "Miles Davis", "Kind of Blue", "Miles Davis/Kind of Blue/01.flac", 562);
        player.add("Naima", "John Coltrane", "Giant Steps", "John Coltrane/Giant Steps/06.flac", 261);
        player.add("Peace Piece", "Bill Evans", "Everybody Digs Bill Evans", "Bill Evans/Everybody Digs/07.flac", 402);
        player
    }

    fn lock(&self) -> MutexGuard<'_, Daemon> {
        // A panicking test thread must not take the other side down with it.
        self.daemon.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a song; returns its id. Bumps the playlist version.
    pub fn add(&self, title: &str, artist: &str, album: &str, file: &str, seconds: u64) -> RowId {
        let mut daemon = self.lock();
        let id = RowId(daemon.next_id);
        daemon.next_id += 1;
        daemon.queue.push(TrackRow {
            id,
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            file: file.to_string(),
            duration: Some(Duration::from_secs(seconds)),
        });
        daemon.version += 1;
        id
    }

    /// Make every call of `kind` fail until `recover` is called.
    pub fn fail_on(&self, kind: CallKind) {
        self.lock().failing.insert(kind);
    }

    pub fn recover(&self, kind: CallKind) {
        self.lock().failing.remove(&kind);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.lock().calls.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    pub fn version(&self) -> u32 {
        self.lock().version
    }

    /// Simulate a change made by another client.
    pub fn set_version(&self, version: u32) {
        self.lock().version = version;
    }

    pub fn set_state(&self, state: PlaybackState) {
        let mut daemon = self.lock();
        if state != PlaybackState::Stopped && daemon.current.is_none() && !daemon.queue.is_empty() {
            daemon.current = Some(0);
        }
        daemon.state = state;
    }

    pub fn set_elapsed(&self, seconds: u32) {
        self.lock().elapsed = seconds;
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.lock().queue.iter().map(|row| row.id).collect()
    }
}

impl Connector for MemoryPlayer {
    type Client = MemoryClient;

    fn connect(&mut self) -> Result<MemoryClient, PlayerError> {
        self.lock().record(Call::Connect).map_err(|_| PlayerError::Connect {
            addr: "memory".to_string(),
            reason: "connection refused".to_string(),
        })?;
        Ok(MemoryClient {
            player: self.clone(),
        })
    }
}

pub struct MemoryClient {
    player: MemoryPlayer,
}

impl MemoryClient {
    fn step(&mut self, delta: isize) -> Result<(), PlayerError> {
        let mut daemon = self.player.lock();
        if daemon.state == PlaybackState::Stopped {
            return Ok(());
        }
        let len = daemon.queue.len() as isize;
        let next = daemon.current.map(|c| c as isize + delta).filter(|&n| n >= 0 && n < len);
        match next {
            Some(n) => daemon.current = Some(n as usize),
            None => {
                daemon.current = None;
                daemon.state = PlaybackState::Stopped;
            }
        }
        daemon.elapsed = 0;
        Ok(())
    }
}

impl PlayerClient for MemoryClient {
    fn status(&mut self) -> Result<Status, PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::Status)?;
        let current = daemon.current.and_then(|i| daemon.queue.get(i).map(|row| (i, row)));
        Ok(Status {
            state: daemon.state,
            song: current.map(|(i, row)| SongPlace {
                index: i as u32,
                id: row.id,
            }),
            elapsed: current
                .filter(|_| daemon.state != PlaybackState::Stopped)
                .map(|_| Duration::from_secs(u64::from(daemon.elapsed))),
            duration: current
                .filter(|_| daemon.state != PlaybackState::Stopped)
                .and_then(|(_, row)| row.duration),
            playlist_version: daemon.version,
        })
    }

    fn current_track(&mut self) -> Result<Option<CurrentTrack>, PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::CurrentTrack)?;
        Ok(daemon.current.and_then(|i| daemon.queue.get(i)).map(|row| CurrentTrack {
            title: row.title.clone(),
            artist: row.artist.clone(),
            album: row.album.clone(),
            file: row.file.clone(),
            duration: row.duration,
        }))
    }

    fn next(&mut self) -> Result<(), PlayerError> {
        self.player.lock().record(Call::Next)?;
        self.step(1)
    }

    fn previous(&mut self) -> Result<(), PlayerError> {
        self.player.lock().record(Call::Previous)?;
        self.step(-1)
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::Stop)?;
        daemon.state = PlaybackState::Stopped;
        daemon.elapsed = 0;
        Ok(())
    }

    fn pause(&mut self, pause: bool) -> Result<(), PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::Pause(pause))?;
        if daemon.state != PlaybackState::Stopped {
            daemon.state = if pause {
                PlaybackState::Paused
            } else {
                PlaybackState::Playing
            };
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::Play)?;
        if daemon.queue.is_empty() {
            return Ok(());
        }
        if daemon.current.is_none() {
            daemon.current = Some(0);
        }
        daemon.state = PlaybackState::Playing;
        daemon.elapsed = 0;
        Ok(())
    }

    fn play_by_id(&mut self, id: RowId) -> Result<(), PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::PlayById(id))?;
        let pos = daemon.position_of(id)?;
        daemon.current = Some(pos);
        daemon.state = PlaybackState::Playing;
        daemon.elapsed = 0;
        Ok(())
    }

    fn seek(&mut self, song_index: u32, seconds: u32) -> Result<(), PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::Seek {
            index: song_index,
            seconds,
        })?;
        if song_index as usize >= daemon.queue.len() {
            return Err(PlayerError::NotFound(format!("song index {}", song_index)));
        }
        daemon.current = Some(song_index as usize);
        daemon.elapsed = seconds;
        Ok(())
    }

    fn playlist(&mut self) -> Result<Vec<TrackRow>, PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::Playlist)?;
        Ok(daemon.queue.clone())
    }

    fn batch(&mut self, ops: &[PlaylistOp]) -> Result<(), PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::Batch(ops.to_vec()))?;
        let current_id = daemon.current.and_then(|i| daemon.queue.get(i)).map(|row| row.id);
        for op in ops {
            match *op {
                PlaylistOp::Move { id, to } => {
                    let from = daemon.position_of(id)?;
                    let row = daemon.queue.remove(from);
                    let to = (to as usize).min(daemon.queue.len());
                    daemon.queue.insert(to, row);
                }
                PlaylistOp::Delete { id } => {
                    let pos = daemon.position_of(id)?;
                    daemon.queue.remove(pos);
                }
            }
            daemon.version += 1;
        }
        daemon.current = current_id.and_then(|id| daemon.queue.iter().position(|row| row.id == id));
        if daemon.current.is_none() {
            daemon.state = PlaybackState::Stopped;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PlayerError> {
        let mut daemon = self.player.lock();
        daemon.record(Call::Clear)?;
        daemon.queue.clear();
        daemon.current = None;
        daemon.state = PlaybackState::Stopped;
        daemon.version += 1;
        Ok(())
    }

    fn close(self) -> Result<(), PlayerError> {
        self.player.lock().record(Call::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_edits_bump_version_once_each() {
        let player = MemoryPlayer::demo();
        let start = player.version();
        let ids = player.ids();
        let mut client = player.clone().connect().unwrap();

        client
            .batch(&[PlaylistOp::Delete { id: ids[0] }, PlaylistOp::Delete { id: ids[1] }])
            .unwrap();

        assert_eq!(player.version(), start + 2);
        assert_eq!(player.ids(), vec![ids[2], ids[3]]);
    }

    #[test]
    fn test_move_keeps_current_song() {
        let player = MemoryPlayer::demo();
        let ids = player.ids();
        let mut client = player.clone().connect().unwrap();
        client.play_by_id(ids[1]).unwrap();

        client.batch(&[PlaylistOp::Move { id: ids[3], to: 0 }]).unwrap();

        let status = client.status().unwrap();
        assert_eq!(status.song.map(|s| s.id), Some(ids[1]));
        assert_eq!(status.song.map(|s| s.index), Some(2));
    }

    #[test]
    fn test_injected_failure_is_logged_and_returned() {
        let player = MemoryPlayer::demo();
        let mut client = player.clone().connect().unwrap();
        player.fail_on(CallKind::Next);

        assert!(client.next().is_err());
        assert_eq!(player.count(CallKind::Next), 1);

        player.recover(CallKind::Next);
        assert!(client.next().is_ok());
    }

    #[test]
    fn test_refused_connection() {
        let mut player = MemoryPlayer::new();
        player.fail_on(CallKind::Connect);
        assert!(matches!(player.connect(), Err(PlayerError::Connect { .. })));
    }
}
