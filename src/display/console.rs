//! Plain-text sink for the terminal front-end.
//!
//! Keeps a model of what a window would show and prints a line whenever a
//! visible part of it changes. Progress is only kept in the model; the
//! `status` command renders it on demand.

use super::{format_progress, DisplaySink, PlaylistRow, UiGate, IDLE_PROGRESS};
use crate::player::RowId;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const NOT_CONNECTED_TITLE: &str = "Not Connected [Juke]";
pub const NOT_CONNECTED_LABEL: &str = "Stopped\nNot connected.";
pub const STOPPED_TITLE: &str = "Stopped [Juke]";
pub const STOPPED_LABEL: &str = "Stopped\nConnected.";
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone)]
struct Screen {
    window_title: String,
    label: String,
    playing: bool,
    artwork: Option<PathBuf>,
    progress: Option<(u32, u32)>,
    rows: Vec<PlaylistRow>,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            window_title: NOT_CONNECTED_TITLE.to_string(),
            label: NOT_CONNECTED_LABEL.to_string(),
            playing: false,
            artwork: None,
            progress: None,
            rows: Vec::new(),
        }
    }
}

/// Window title and two-line label for a track.
pub fn track_label(title: &str, artist: &str, album: &str) -> (String, String) {
    let title = if title.is_empty() { UNKNOWN } else { title };
    let artist = if artist.is_empty() { UNKNOWN } else { artist };

    let window_title = format!("{} by {} [Juke]", title, artist);
    let mut label = format!("{}\nby {}", title, artist);
    if !album.is_empty() {
        label.push_str(" from ");
        label.push_str(album);
    }
    (window_title, label)
}

pub struct ConsoleSink {
    gate: UiGate,
    screen: Mutex<Screen>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            gate: UiGate::new(),
            screen: Mutex::new(Screen::default()),
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn print(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Losing a console line is not worth failing a request over.
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }

    fn set_label(&self, window_title: String, label: String) {
        let changed = {
            let mut screen = self.screen();
            let changed = screen.label != label || screen.window_title != window_title;
            screen.window_title = window_title;
            screen.label = label.clone();
            changed
        };
        if changed {
            self.print(&format!("== {}", label.replace('\n', " | ")));
        }
    }

    /// Everything a status bar would show.
    pub fn render_status(&self) -> String {
        let screen = self.screen();
        let progress = screen
            .progress
            .map(|(at, total)| format_progress(at, total))
            .unwrap_or_else(|| IDLE_PROGRESS.to_string());
        let art = screen
            .artwork
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "no cover".to_string());
        format!(
            "{}\n{}\n[{}] {}  ({})",
            screen.window_title,
            screen.label,
            if screen.playing { "playing" } else { "paused/stopped" },
            progress,
            art
        )
    }

    pub fn render_playlist(&self) -> String {
        let screen = self.screen();
        if screen.rows.is_empty() {
            return "(playlist empty)".to_string();
        }
        screen
            .rows
            .iter()
            .map(|row| {
                format!(
                    "{} {:>4}  {} | {} | {}",
                    if row.is_current { '>' } else { ' ' },
                    row.id,
                    if row.title.is_empty() { UNKNOWN } else { row.title.as_str() },
                    if row.artist.is_empty() { UNKNOWN } else { row.artist.as_str() },
                    row.album
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl DisplaySink for ConsoleSink {
    fn acquire_ui_lock(&self) {
        self.gate.acquire();
    }

    fn release_ui_lock(&self) {
        self.gate.release();
    }

    fn set_track_label(&self, title: &str, artist: &str, album: &str) {
        let (window_title, label) = track_label(title, artist, album);
        self.set_label(window_title, label);
    }

    fn set_disconnected_label(&self) {
        self.set_label(NOT_CONNECTED_TITLE.to_string(), NOT_CONNECTED_LABEL.to_string());
    }

    fn set_stopped_label(&self) {
        self.set_label(STOPPED_TITLE.to_string(), STOPPED_LABEL.to_string());
    }

    fn set_play_pause_icon(&self, playing: bool) {
        self.screen().playing = playing;
    }

    fn set_album_art(&self, path: Option<&Path>) {
        let changed = {
            let mut screen = self.screen();
            if screen.artwork.as_deref() == path {
                false
            } else {
                screen.artwork = path.map(Path::to_path_buf);
                true
            }
        };
        if changed {
            match path {
                Some(p) => self.print(&format!("   cover: {}", p.display())),
                None => self.print("   cover: none"),
            }
        }
    }

    fn set_progress(&self, elapsed_secs: u32, total_secs: u32) {
        self.screen().progress = Some((elapsed_secs, total_secs));
    }

    fn set_progress_idle(&self) {
        self.screen().progress = None;
    }

    fn replace_playlist_rows(&self, rows: Vec<PlaylistRow>) {
        let count = rows.len();
        self.screen().rows = rows;
        self.print(&format!("   playlist: {} rows", count));
    }

    fn remove_playlist_rows(&self, ids: &[RowId]) {
        self.screen().rows.retain(|row| !ids.contains(&row.id));
        self.print(&format!("   playlist: removed {} rows", ids.len()));
    }

    fn reorder_playlist_rows(&self, ordered: &[RowId]) {
        let mut screen = self.screen();
        let (mut rows, rest): (Vec<_>, Vec<_>) = screen
            .rows
            .drain(..)
            .partition(|row| ordered.contains(&row.id));
        rows.sort_by_key(|row| ordered.iter().position(|id| *id == row.id));
        rows.extend(rest);
        screen.rows = rows;
    }

    fn clear_playlist_rows(&self) {
        self.screen().rows.clear();
        self.print("   playlist: cleared");
    }

    fn highlight_row(&self, id: RowId) {
        let mut screen = self.screen();
        for row in screen.rows.iter_mut() {
            row.is_current = row.id == id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u32, title: &str, is_current: bool) -> PlaylistRow {
        PlaylistRow {
            id: RowId(id),
            artwork: None,
            title: title.to_string(),
            artist: "Artist".to_string(),
            album: String::new(),
            is_current,
        }
    }

    #[test]
    fn test_track_label_fills_unknowns() {
        let (title, label) = track_label("", "", "");
        assert_eq!(title, "Unknown by Unknown [Juke]");
        assert_eq!(label, "Unknown\nby Unknown");

        let (title, label) = track_label("Naima", "John Coltrane", "Giant Steps");
        assert_eq!(title, "Naima by John Coltrane [Juke]");
        assert_eq!(label, "Naima\nby John Coltrane from Giant Steps");
    }

    #[test]
    fn test_highlight_keeps_single_mark() {
        let sink = ConsoleSink::new(Box::new(io::sink()));
        sink.replace_playlist_rows(vec![row(1, "A", true), row(2, "B", false), row(3, "C", false)]);

        sink.highlight_row(RowId(3));

        let listing = sink.render_playlist();
        let marked: Vec<&str> = listing.lines().filter(|l| l.starts_with('>')).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("C"));
    }

    #[test]
    fn test_status_shows_idle_progress_after_reset() {
        let sink = ConsoleSink::new(Box::new(io::sink()));
        sink.set_progress(75, 200);
        assert!(sink.render_status().contains("1:15 / 3:20"));

        sink.set_progress_idle();
        sink.set_stopped_label();
        let status = sink.render_status();
        assert!(status.contains(IDLE_PROGRESS));
        assert!(status.starts_with(STOPPED_TITLE));
    }

    #[test]
    fn test_remove_rows_by_id() {
        let sink = ConsoleSink::new(Box::new(io::sink()));
        sink.replace_playlist_rows(vec![row(1, "A", false), row(2, "B", false), row(3, "C", false)]);
        sink.remove_playlist_rows(&[RowId(1), RowId(3)]);
        assert_eq!(sink.render_playlist().lines().count(), 1);

        sink.clear_playlist_rows();
        assert_eq!(sink.render_playlist(), "(playlist empty)");
    }

    #[test]
    fn test_reorder_moves_named_rows_to_top() {
        let sink = ConsoleSink::new(Box::new(io::sink()));
        sink.replace_playlist_rows(vec![
            row(1, "A", false),
            row(2, "B", true),
            row(3, "C", false),
            row(4, "D", false),
        ]);

        sink.reorder_playlist_rows(&[RowId(4), RowId(1)]);

        let titles: Vec<String> = sink
            .render_playlist()
            .lines()
            .map(|line| line[8..].split(" | ").next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(titles, vec!["D", "A", "B", "C"]);
        assert!(sink.render_playlist().lines().nth(2).unwrap().starts_with('>'));
    }
}
