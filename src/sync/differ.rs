//! Decides when the playlist has to be fetched again and what the display
//! needs to change.
//!
//! The player bumps a version number on every structural playlist change.
//! A version above the cached one means the list must be rebuilt; the same
//! version means at most the current-track mark moved.

use crate::display::PlaylistRow;
use crate::player::{RowId, TrackRow};
use std::path::PathBuf;
use tracing::warn;

/// What a status report asks of the playlist view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistUpdate {
    Unchanged,
    /// Fetch everything and replace the rows in one batch.
    Replace { version: u32 },
    /// Only the current-track mark moves.
    Highlight(RowId),
}

/// The engine's cached picture of the remote playlist.
#[derive(Debug, Clone, Default)]
pub struct PlaylistDiffer {
    /// `None` is the "unknown" sentinel and orders below every real version.
    version: Option<u32>,
    rows: Vec<RowId>,
    current: Option<RowId>,
}

impl PlaylistDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn current(&self) -> Option<RowId> {
        self.current
    }

    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    pub fn plan(&self, reported_version: u32, current_song: Option<RowId>) -> PlaylistUpdate {
        if Some(reported_version) > self.version {
            return PlaylistUpdate::Replace {
                version: reported_version,
            };
        }

        let Some(id) = current_song else {
            return PlaylistUpdate::Unchanged;
        };
        if self.current == Some(id) {
            return PlaylistUpdate::Unchanged;
        }
        if self.rows.contains(&id) {
            PlaylistUpdate::Highlight(id)
        } else {
            warn!(origin = "playlist", "never found row with id {}", id);
            PlaylistUpdate::Unchanged
        }
    }

    /// Build display rows from a fresh fetch and cache `version`.
    pub fn rebuild(
        &mut self,
        version: u32,
        tracks: Vec<TrackRow>,
        current_song: Option<RowId>,
        artwork: impl Fn(&str) -> Option<PathBuf>,
    ) -> Vec<PlaylistRow> {
        let mut marked = None;
        let rows: Vec<PlaylistRow> = tracks
            .into_iter()
            .map(|track| {
                let is_current = marked.is_none() && current_song == Some(track.id);
                if is_current {
                    marked = Some(track.id);
                }
                PlaylistRow {
                    id: track.id,
                    artwork: artwork(&track.file),
                    title: track.title,
                    artist: track.artist,
                    album: track.album,
                    is_current,
                }
            })
            .collect();

        self.rows = rows.iter().map(|row| row.id).collect();
        self.current = marked;
        self.advance_to(version);
        rows
    }

    pub fn mark_current(&mut self, id: RowId) {
        self.current = Some(id);
    }

    /// The optimistic bump after our own playlist edits. Only applies while
    /// the cached version is known.
    pub fn bump(&mut self, edits: u32) {
        if let Some(version) = self.version {
            self.version = Some(version.saturating_add(edits));
        }
    }

    /// Rows `ordered` now lead the playlist, in that order.
    pub fn reorder(&mut self, ordered: &[RowId]) {
        let rest = self.rows.iter().copied().filter(|id| !ordered.contains(id));
        self.rows = ordered.iter().copied().chain(rest).collect();
    }

    pub fn remove(&mut self, ids: &[RowId]) {
        self.rows.retain(|id| !ids.contains(id));
        if self.current.is_some_and(|id| ids.contains(&id)) {
            self.current = None;
        }
    }

    /// Forget everything, version included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn advance_to(&mut self, version: u32) {
        if Some(version) > self.version {
            self.version = Some(version);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: u32) -> TrackRow {
        TrackRow {
            id: RowId(id),
            title: format!("Song {}", id),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            file: format!("Artist/Album/{:02}.flac", id),
            duration: None,
        }
    }

    fn loaded(version: u32, current: Option<u32>) -> PlaylistDiffer {
        let mut differ = PlaylistDiffer::new();
        differ.rebuild(
            version,
            (1..=4).map(track).collect(),
            current.map(RowId),
            |_| None,
        );
        differ
    }

    #[test]
    fn test_unknown_version_always_fetches() {
        let differ = PlaylistDiffer::new();
        assert_eq!(differ.plan(0, None), PlaylistUpdate::Replace { version: 0 });
    }

    #[test]
    fn test_newer_version_fetches() {
        let differ = loaded(5, Some(1));
        assert_eq!(differ.plan(7, Some(RowId(1))), PlaylistUpdate::Replace { version: 7 });
    }

    #[test]
    fn test_same_version_same_song_is_unchanged() {
        let differ = loaded(5, Some(2));
        assert_eq!(differ.plan(5, Some(RowId(2))), PlaylistUpdate::Unchanged);
        assert_eq!(differ.plan(5, None), PlaylistUpdate::Unchanged);
    }

    #[test]
    fn test_older_version_does_not_roll_back() {
        let mut differ = loaded(5, None);
        assert_eq!(differ.plan(3, None), PlaylistUpdate::Unchanged);
        differ.rebuild(3, vec![track(1)], None, |_| None);
        assert_eq!(differ.version(), Some(5));
    }

    #[test]
    fn test_moved_song_highlights() {
        let differ = loaded(5, Some(1));
        assert_eq!(differ.plan(5, Some(RowId(3))), PlaylistUpdate::Highlight(RowId(3)));
    }

    #[test]
    fn test_unknown_song_is_not_highlighted() {
        let differ = loaded(5, Some(1));
        assert_eq!(differ.plan(5, Some(RowId(99))), PlaylistUpdate::Unchanged);
    }

    #[test]
    fn test_rebuild_marks_exactly_one_row() {
        let mut differ = PlaylistDiffer::new();
        let rows = differ.rebuild(
            2,
            vec![track(1), track(2), track(3)],
            Some(RowId(2)),
            |file| Some(PathBuf::from(file).with_file_name("cover.jpg")),
        );

        let marked: Vec<RowId> = rows.iter().filter(|r| r.is_current).map(|r| r.id).collect();
        assert_eq!(marked, vec![RowId(2)]);
        assert_eq!(rows[0].artwork, Some(PathBuf::from("Artist/Album/cover.jpg")));
        assert_eq!(differ.current(), Some(RowId(2)));
        assert_eq!(differ.version(), Some(2));
    }

    #[test]
    fn test_bump_only_when_known() {
        let mut differ = PlaylistDiffer::new();
        differ.bump(3);
        assert_eq!(differ.version(), None);

        let mut differ = loaded(5, None);
        differ.bump(3);
        assert_eq!(differ.version(), Some(8));
        assert_eq!(differ.plan(8, None), PlaylistUpdate::Unchanged);
    }

    #[test]
    fn test_reorder_and_remove() {
        let mut differ = loaded(5, Some(3));
        differ.reorder(&[RowId(4), RowId(2)]);
        assert_eq!(differ.rows(), &[RowId(4), RowId(2), RowId(1), RowId(3)]);

        differ.remove(&[RowId(3), RowId(1)]);
        assert_eq!(differ.rows(), &[RowId(4), RowId(2)]);
        assert_eq!(differ.current(), None);
    }

    #[test]
    fn test_reset_returns_to_sentinel() {
        let mut differ = loaded(5, Some(1));
        differ.reset();
        assert_eq!(differ.version(), None);
        assert!(differ.rows().is_empty());
        assert_eq!(differ.plan(0, None), PlaylistUpdate::Replace { version: 0 });
    }
}
