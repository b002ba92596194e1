//! Headless sink that records every command it receives.

use super::{DisplaySink, PlaylistRow, UiGate};
use crate::player::RowId;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCommand {
    Lock,
    Unlock,
    TrackLabel {
        title: String,
        artist: String,
        album: String,
    },
    DisconnectedLabel,
    StoppedLabel,
    PlayPauseIcon(bool),
    AlbumArt(Option<PathBuf>),
    Progress { elapsed: u32, total: u32 },
    ProgressIdle,
    ReplaceRows(Vec<PlaylistRow>),
    RemoveRows(Vec<RowId>),
    ReorderRows(Vec<RowId>),
    ClearRows,
    Highlight(RowId),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    gate: UiGate,
    commands: Mutex<Vec<DisplayCommand>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<DisplayCommand>> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, command: DisplayCommand) {
        self.log().push(command);
    }

    pub fn commands(&self) -> Vec<DisplayCommand> {
        self.log().clone()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<DisplayCommand> {
        std::mem::take(&mut *self.log())
    }

    pub fn count(&self, predicate: impl Fn(&DisplayCommand) -> bool) -> usize {
        self.log().iter().filter(|c| predicate(c)).count()
    }

    pub fn is_locked(&self) -> bool {
        self.gate.is_held()
    }
}

impl DisplaySink for RecordingSink {
    fn acquire_ui_lock(&self) {
        self.gate.acquire();
        self.push(DisplayCommand::Lock);
    }

    fn release_ui_lock(&self) {
        self.push(DisplayCommand::Unlock);
        self.gate.release();
    }

    fn set_track_label(&self, title: &str, artist: &str, album: &str) {
        self.push(DisplayCommand::TrackLabel {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
        });
    }

    fn set_disconnected_label(&self) {
        self.push(DisplayCommand::DisconnectedLabel);
    }

    fn set_stopped_label(&self) {
        self.push(DisplayCommand::StoppedLabel);
    }

    fn set_play_pause_icon(&self, playing: bool) {
        self.push(DisplayCommand::PlayPauseIcon(playing));
    }

    fn set_album_art(&self, path: Option<&Path>) {
        self.push(DisplayCommand::AlbumArt(path.map(Path::to_path_buf)));
    }

    fn set_progress(&self, elapsed_secs: u32, total_secs: u32) {
        self.push(DisplayCommand::Progress {
            elapsed: elapsed_secs,
            total: total_secs,
        });
    }

    fn set_progress_idle(&self) {
        self.push(DisplayCommand::ProgressIdle);
    }

    fn replace_playlist_rows(&self, rows: Vec<PlaylistRow>) {
        self.push(DisplayCommand::ReplaceRows(rows));
    }

    fn remove_playlist_rows(&self, ids: &[RowId]) {
        self.push(DisplayCommand::RemoveRows(ids.to_vec()));
    }

    fn reorder_playlist_rows(&self, ordered: &[RowId]) {
        self.push(DisplayCommand::ReorderRows(ordered.to_vec()));
    }

    fn clear_playlist_rows(&self) {
        self.push(DisplayCommand::ClearRows);
    }

    fn highlight_row(&self, id: RowId) {
        self.push(DisplayCommand::Highlight(id));
    }
}
