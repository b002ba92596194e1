//! The single consumer of the request queue.
//!
//! The engine owns the connection, the connection state and the cached
//! playlist picture. Nothing else mutates them, so none of it is locked.
//! Every request is handled while holding the display's UI lock.

use super::differ::{PlaylistDiffer, PlaylistUpdate};
use super::error::{report, SyncError};
use super::poller::Poller;
use super::rate::{rate_channel, PollIntervals, PollRate, RateSender};
use super::request::{ConnectionState, Request, RequestQueue, RequestSender};
use crate::artwork::ArtworkLocator;
use crate::display::{DisplaySink, UiLock};
use crate::player::{Connector, PlaybackState, PlayerClient, PlaylistOp, RowId, Status};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::WeakUnboundedSender;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub intervals: PollIntervals,
    pub artwork: ArtworkLocator,
}

impl Default for EngineConfig {
    /// Default intervals, no cover lookup.
    fn default() -> Self {
        Self {
            intervals: PollIntervals::default(),
            artwork: ArtworkLocator::new(PathBuf::new(), Vec::new()),
        }
    }
}

/// Target second for a click at `x` on a bar `width` pixels wide.
pub fn seek_target(x: u32, width: u32, length_secs: u32) -> Result<u32, SyncError> {
    if width == 0 {
        return Err(SyncError::Conversion("progress bar has zero width".to_string()));
    }
    let fraction = f64::from(x.min(width)) / f64::from(width);
    Ok((fraction * f64::from(length_secs)).round() as u32)
}

fn whole_seconds(value: Option<Duration>, field: &str) -> Result<u32, SyncError> {
    let value = value.ok_or_else(|| SyncError::Conversion(format!("no {} reported", field)))?;
    u32::try_from(value.as_secs())
        .map_err(|_| SyncError::Conversion(format!("{} out of range: {:?}", field, value)))
}

fn origin(request: &Request) -> &'static str {
    match request {
        Request::PollRefresh => "poll",
        Request::ConnectionRefresh => "connect",
        Request::Next => "next",
        Request::Previous => "previous",
        Request::PlayOrPause => "play-pause",
        Request::Stop => "stop",
        Request::SeekAt { .. } => "seek",
        Request::ChangeTrack(_) => "change-track",
        Request::SortPlaylist(_) => "sort-playlist",
        Request::RemovePlaylist(_) => "remove-playlist",
        Request::ClearPlaylist => "clear-playlist",
    }
}

pub struct Engine<C: Connector> {
    connector: C,
    client: Option<C::Client>,
    state: ConnectionState,
    display: Arc<dyn DisplaySink>,
    differ: PlaylistDiffer,
    artwork: ArtworkLocator,
    intervals: PollIntervals,
    poller: Option<RateSender>,
    requests: WeakUnboundedSender<Request>,
    runtime: Handle,
}

impl<C: Connector> Engine<C> {
    /// `runtime` is where pollers get spawned; `requests` is the queue this
    /// engine will drain.
    pub fn new(
        connector: C,
        display: Arc<dyn DisplaySink>,
        config: EngineConfig,
        requests: &RequestSender,
        runtime: Handle,
    ) -> Self {
        Self {
            connector,
            client: None,
            state: ConnectionState::Disconnected,
            display,
            differ: PlaylistDiffer::new(),
            artwork: config.artwork,
            intervals: config.intervals,
            poller: None,
            requests: requests.downgrade(),
            runtime,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn playlist_version(&self) -> Option<u32> {
        self.differ.version()
    }

    /// Drain the queue until every sender is gone, then shut down.
    ///
    /// Blocks the calling thread; run it on a blocking task.
    pub fn run(mut self, mut queue: RequestQueue) {
        info!("engine running");
        while let Some(request) = queue.blocking_recv() {
            self.dispatch(request);
        }
        self.shutdown();
    }

    /// Handle one request to completion.
    pub fn dispatch(&mut self, request: Request) {
        let display = Arc::clone(&self.display);
        let ui = UiLock::acquire(display.as_ref());

        let Some(mut client) = self.client.take() else {
            self.handle_disconnected(&ui, request);
            return;
        };

        match self.handle(&mut client, &ui, &request) {
            Ok(()) => self.client = Some(client),
            Err(err) if err.is_connectivity() => {
                report(origin(&request), &err);
                drop(client);
                self.lose_connection(&ui);
            }
            Err(err) => {
                report(origin(&request), &err);
                self.client = Some(client);
            }
        }
    }

    fn handle_disconnected(&mut self, ui: &UiLock<'_>, request: Request) {
        if request != Request::ConnectionRefresh {
            debug!("not connected, dropping {:?}", request);
            return;
        }

        match self.connector.connect() {
            Ok(client) => {
                info!("connected to player");
                self.client = Some(client);
                self.state = ConnectionState::Unknown;
                self.start_poller();
            }
            Err(e) => {
                report("connect", &SyncError::Connectivity(e));
                ui.set_disconnected_label();
            }
        }
    }

    fn handle(
        &mut self,
        client: &mut C::Client,
        ui: &UiLock<'_>,
        request: &Request,
    ) -> Result<(), SyncError> {
        match request {
            Request::PollRefresh => self.poll_refresh(client, ui),
            Request::ConnectionRefresh => {
                debug!("already connected");
                Ok(())
            }
            Request::Next | Request::Previous => self.skip(client, ui, request == &Request::Next),
            Request::PlayOrPause => self.play_or_pause(client, ui),
            Request::Stop => {
                client.stop().map_err(SyncError::command("stop"))?;
                self.show_stopped(ui);
                Ok(())
            }
            Request::SeekAt { x, width } => self.seek_at(client, ui, *x, *width),
            Request::ChangeTrack(id) => {
                client.play_by_id(*id).map_err(SyncError::command("play by id"))?;
                ui.set_play_pause_icon(true);
                self.state = ConnectionState::Playing;
                ui.highlight_row(*id);
                self.differ.mark_current(*id);
                Ok(())
            }
            Request::SortPlaylist(ids) => self.sort_playlist(client, ui, ids),
            Request::RemovePlaylist(ids) => self.remove_from_playlist(client, ui, ids),
            Request::ClearPlaylist => {
                client.clear().map_err(SyncError::command("clear"))?;
                self.differ.reset();
                ui.clear_playlist_rows();
                Ok(())
            }
        }
    }

    fn poll_refresh(&mut self, client: &mut C::Client, ui: &UiLock<'_>) -> Result<(), SyncError> {
        let status = client.status().map_err(SyncError::Connectivity)?;

        match status.state {
            PlaybackState::Stopped => {
                self.show_stopped(ui);
                self.answer_poll();
            }
            PlaybackState::Paused | PlaybackState::Playing => {
                let playing = status.state == PlaybackState::Playing;
                ui.set_play_pause_icon(playing);
                self.state = if playing {
                    ConnectionState::Playing
                } else {
                    ConnectionState::Paused
                };
                self.answer_poll();
                self.show_current_track(
                    client,
                    ui,
                    whole_seconds(status.elapsed, "elapsed time"),
                    status.duration,
                );
            }
        }

        self.refresh_playlist(client, ui, &status);
        Ok(())
    }

    fn answer_poll(&mut self) {
        let rate = PollRate::for_state(self.state);
        if let Some(rates) = &self.poller {
            if !rates.send(rate) {
                warn!("poller went away");
                self.poller = None;
            }
        }
    }

    fn refresh_playlist(&mut self, client: &mut C::Client, ui: &UiLock<'_>, status: &Status) {
        let current = status.song.map(|place| place.id);
        match self.differ.plan(status.playlist_version, current) {
            PlaylistUpdate::Unchanged => {}
            PlaylistUpdate::Highlight(id) => {
                ui.highlight_row(id);
                self.differ.mark_current(id);
            }
            PlaylistUpdate::Replace { version } => match client.playlist() {
                Ok(tracks) => {
                    let artwork = &self.artwork;
                    let rows = self
                        .differ
                        .rebuild(version, tracks, current, |file| artwork.locate(file));
                    ui.replace_playlist_rows(rows);
                }
                Err(e) => report("playlist", &SyncError::Command { op: "playlist", source: e }),
            },
        }
    }

    /// Label, cover and progress for whatever the player is on now.
    /// Failures only skip the affected display update.
    fn show_current_track(
        &self,
        client: &mut C::Client,
        ui: &UiLock<'_>,
        elapsed: Result<u32, SyncError>,
        reported_total: Option<Duration>,
    ) {
        let track = match client.current_track() {
            Ok(Some(track)) => track,
            Ok(None) => {
                debug!("player reports no current song");
                return;
            }
            Err(e) => {
                report("current-track", &SyncError::Command { op: "current song", source: e });
                return;
            }
        };

        ui.set_track_label(&track.title, &track.artist, &track.album);
        ui.set_album_art(self.artwork.locate(&track.file).as_deref());

        let progress = elapsed.and_then(|at| {
            whole_seconds(track.duration.or(reported_total), "track length").map(|total| (at, total))
        });
        match progress {
            Ok((at, total)) => ui.set_progress(at, total),
            Err(e) => report("progress", &e),
        }
    }

    fn show_stopped(&mut self, ui: &UiLock<'_>) {
        ui.set_play_pause_icon(false);
        ui.set_stopped_label();
        ui.set_album_art(None);
        ui.set_progress_idle();
        self.state = ConnectionState::Stopped;
    }

    fn skip(&mut self, client: &mut C::Client, ui: &UiLock<'_>, forward: bool) -> Result<(), SyncError> {
        if self.state == ConnectionState::Stopped {
            debug!("stopped, ignoring skip");
            return Ok(());
        }
        if forward {
            client.next().map_err(SyncError::command("next"))?;
        } else {
            client.previous().map_err(SyncError::command("previous"))?;
        }
        self.show_current_track(client, ui, Ok(0), None);
        Ok(())
    }

    fn play_or_pause(&mut self, client: &mut C::Client, ui: &UiLock<'_>) -> Result<(), SyncError> {
        match self.state {
            ConnectionState::Playing => {
                client.pause(true).map_err(SyncError::command("pause"))?;
                ui.set_play_pause_icon(false);
                self.state = ConnectionState::Paused;
            }
            ConnectionState::Paused => {
                client.pause(false).map_err(SyncError::command("resume"))?;
                ui.set_play_pause_icon(true);
                self.state = ConnectionState::Playing;
            }
            ConnectionState::Stopped => {
                client.play().map_err(SyncError::command("play"))?;
                ui.set_play_pause_icon(true);
                self.state = ConnectionState::Playing;
                self.show_current_track(client, ui, Ok(0), None);
            }
            ConnectionState::Unknown | ConnectionState::Disconnected => {
                debug!("playback state not known yet, ignoring play/pause");
            }
        }
        Ok(())
    }

    fn seek_at(
        &mut self,
        client: &mut C::Client,
        ui: &UiLock<'_>,
        x: u32,
        width: u32,
    ) -> Result<(), SyncError> {
        if !self.state.has_track() {
            debug!("nothing to seek in");
            return Ok(());
        }
        let status = client.status().map_err(SyncError::command("status"))?;
        let song = status
            .song
            .ok_or_else(|| SyncError::Conversion("no current song reported".to_string()))?;
        let length = whole_seconds(status.duration, "track length")?;
        let target = seek_target(x, width, length)?;

        client.seek(song.index, target).map_err(SyncError::command("seek"))?;
        ui.set_progress(target, length);
        Ok(())
    }

    fn sort_playlist(
        &mut self,
        client: &mut C::Client,
        ui: &UiLock<'_>,
        ids: &[RowId],
    ) -> Result<(), SyncError> {
        if ids.is_empty() {
            return Ok(());
        }
        let ops: Vec<PlaylistOp> = ids
            .iter()
            .zip(0u32..)
            .map(|(&id, to)| PlaylistOp::Move { id, to })
            .collect();
        client.batch(&ops).map_err(SyncError::command("move"))?;
        self.differ.bump(u32::try_from(ops.len()).unwrap_or(u32::MAX));
        self.differ.reorder(ids);
        ui.reorder_playlist_rows(ids);
        Ok(())
    }

    fn remove_from_playlist(
        &mut self,
        client: &mut C::Client,
        ui: &UiLock<'_>,
        ids: &[RowId],
    ) -> Result<(), SyncError> {
        if ids.is_empty() {
            return Ok(());
        }
        let ops: Vec<PlaylistOp> = ids.iter().map(|&id| PlaylistOp::Delete { id }).collect();
        client.batch(&ops).map_err(SyncError::command("delete"))?;
        self.differ.bump(u32::try_from(ops.len()).unwrap_or(u32::MAX));
        self.differ.remove(ids);
        ui.remove_playlist_rows(ids);
        Ok(())
    }

    fn lose_connection(&mut self, ui: &UiLock<'_>) {
        warn!("lost connection to player, waiting for a reconnect");
        self.state = ConnectionState::Disconnected;
        self.differ.reset();

        ui.set_play_pause_icon(false);
        ui.set_disconnected_label();
        ui.set_album_art(None);
        ui.set_progress_idle();
        ui.clear_playlist_rows();

        if let Some(rates) = self.poller.take() {
            rates.stop();
        }
    }

    fn start_poller(&mut self) {
        let (rates, rate_rx) = rate_channel();
        if let Some(stale) = self.poller.replace(rates) {
            stale.stop();
        }
        let poller = Poller::new(self.requests.clone(), rate_rx, self.intervals);
        self.runtime.spawn(poller.run());
    }

    fn shutdown(&mut self) {
        if let Some(rates) = self.poller.take() {
            rates.stop();
        }
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close() {
                report("shutdown", &SyncError::Command { op: "close", source: e });
            }
        }
        self.state = ConnectionState::Disconnected;
        info!("engine stopped");
    }
}
