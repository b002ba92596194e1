//! Presentation boundary.
//!
//! The engine never draws anything itself; it issues commands to a
//! [`DisplaySink`]. Sinks are shared across threads, so every mutation the
//! engine performs happens while it holds the sink's UI lock through a
//! [`UiLock`] guard.

pub mod console;
pub mod recording;

use crate::player::RowId;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

pub use console::ConsoleSink;
pub use recording::{DisplayCommand, RecordingSink};

/// A visible row of the current playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRow {
    pub id: RowId,
    pub artwork: Option<PathBuf>,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub is_current: bool,
}

pub trait DisplaySink: Send + Sync {
    fn acquire_ui_lock(&self);
    fn release_ui_lock(&self);

    /// Empty `title` or `artist` render as "Unknown"; an empty `album` is omitted.
    fn set_track_label(&self, title: &str, artist: &str, album: &str);
    fn set_disconnected_label(&self);
    fn set_stopped_label(&self);
    fn set_play_pause_icon(&self, playing: bool);
    /// `None` shows the placeholder cover.
    fn set_album_art(&self, path: Option<&Path>);
    fn set_progress(&self, elapsed_secs: u32, total_secs: u32);
    fn set_progress_idle(&self);
    /// Replace every row in one go.
    fn replace_playlist_rows(&self, rows: Vec<PlaylistRow>);
    fn remove_playlist_rows(&self, ids: &[RowId]);
    /// Rows in `ordered` move to the top in that order; the rest keep theirs.
    fn reorder_playlist_rows(&self, ordered: &[RowId]);
    fn clear_playlist_rows(&self);
    /// Mark `id` as the current track. The previously marked row is unmarked first.
    fn highlight_row(&self, id: RowId);
}

/// Holds a sink's UI lock for as long as it lives.
pub struct UiLock<'a> {
    sink: &'a dyn DisplaySink,
}

impl<'a> UiLock<'a> {
    pub fn acquire(sink: &'a dyn DisplaySink) -> Self {
        sink.acquire_ui_lock();
        Self { sink }
    }
}

impl<'a> Deref for UiLock<'a> {
    type Target = dyn DisplaySink + 'a;

    fn deref(&self) -> &Self::Target {
        self.sink
    }
}

impl Drop for UiLock<'_> {
    fn drop(&mut self) {
        self.sink.release_ui_lock();
    }
}

/// A non-reentrant lock with separate acquire and release calls, for sinks
/// to back [`DisplaySink::acquire_ui_lock`] with.
#[derive(Debug, Default)]
pub struct UiGate {
    held: Mutex<bool>,
    released: Condvar,
}

impl UiGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn held(&self) -> MutexGuard<'_, bool> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acquire(&self) {
        let mut held = self.held();
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
    }

    pub fn release(&self) {
        *self.held() = false;
        self.released.notify_one();
    }

    pub fn is_held(&self) -> bool {
        *self.held()
    }
}

/// `m:ss / m:ss`, seconds zero-padded.
pub fn format_progress(elapsed_secs: u32, total_secs: u32) -> String {
    format!(
        "{}:{:02} / {}:{:02}",
        elapsed_secs / 60,
        elapsed_secs % 60,
        total_secs / 60,
        total_secs % 60
    )
}

pub const IDLE_PROGRESS: &str = "0:00 / 0:00";
