//! Remote player client over the Music Player Daemon protocol.

use super::error::PlayerError;
use super::traits::{
    Connector, CurrentTrack, PlaybackState, PlayerClient, PlaylistOp, RowId, SongPlace, Status,
    TrackRow,
};
use mpd::{Client, Id, Song, State};
use std::net::TcpStream;

/// Dials a fresh MPD connection on every `connect`.
#[derive(Debug, Clone)]
pub struct MpdConnector {
    host: String,
    port: u16,
}

impl MpdConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for MpdConnector {
    fn default() -> Self {
        Self::new("localhost", 6600)
    }
}

impl Connector for MpdConnector {
    type Client = MpdClient;

    fn connect(&mut self) -> Result<MpdClient, PlayerError> {
        let addr = self.addr();
        match Client::connect(&addr) {
            Ok(client) => Ok(MpdClient { client }),
            Err(e) => Err(PlayerError::Connect {
                addr,
                reason: e.to_string(),
            }),
        }
    }
}

pub struct MpdClient {
    client: Client<TcpStream>,
}

// Helper to find tag value (case-insensitive)
fn find_tag(tags: &[(String, String)], key: &str) -> Option<String> {
    let key_lower = key.to_lowercase();
    tags.iter()
        .find(|(k, _)| k.to_lowercase() == key_lower)
        .map(|(_, v)| v.clone())
}

fn artist_of(song: &Song) -> String {
    song.artist
        .clone()
        .or_else(|| find_tag(&song.tags, "Artist"))
        .or_else(|| find_tag(&song.tags, "AlbumArtist"))
        .unwrap_or_default()
}

fn title_of(song: &Song) -> String {
    song.title
        .clone()
        .or_else(|| find_tag(&song.tags, "Title"))
        .unwrap_or_default()
}

impl PlayerClient for MpdClient {
    fn status(&mut self) -> Result<Status, PlayerError> {
        let status = self.client.status()?;
        Ok(Status {
            state: match status.state {
                State::Play => PlaybackState::Playing,
                State::Pause => PlaybackState::Paused,
                State::Stop => PlaybackState::Stopped,
            },
            song: status.song.map(|place| SongPlace {
                index: place.pos,
                id: RowId(place.id.0),
            }),
            elapsed: status.elapsed,
            duration: status.duration,
            playlist_version: status.queue_version,
        })
    }

    fn current_track(&mut self) -> Result<Option<CurrentTrack>, PlayerError> {
        Ok(self.client.currentsong()?.map(|song| CurrentTrack {
            title: title_of(&song),
            artist: artist_of(&song),
            album: find_tag(&song.tags, "Album").unwrap_or_default(),
            duration: song.duration,
            file: song.file,
        }))
    }

    fn next(&mut self) -> Result<(), PlayerError> {
        Ok(self.client.next()?)
    }

    fn previous(&mut self) -> Result<(), PlayerError> {
        Ok(self.client.prev()?)
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        Ok(self.client.stop()?)
    }

    fn pause(&mut self, pause: bool) -> Result<(), PlayerError> {
        Ok(self.client.pause(pause)?)
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        Ok(self.client.play()?)
    }

    fn play_by_id(&mut self, id: RowId) -> Result<(), PlayerError> {
        Ok(self.client.switch(Id(id.0))?)
    }

    fn seek(&mut self, song_index: u32, seconds: u32) -> Result<(), PlayerError> {
        Ok(self.client.seek(song_index, f64::from(seconds))?)
    }

    fn playlist(&mut self) -> Result<Vec<TrackRow>, PlayerError> {
        let queue = self.client.queue()?;
        queue
            .into_iter()
            .map(|song| {
                let place = song
                    .place
                    .ok_or_else(|| PlayerError::Protocol(format!("queue entry {} has no id", song.file)))?;
                Ok(TrackRow {
                    id: RowId(place.id.0),
                    title: title_of(&song),
                    artist: artist_of(&song),
                    album: find_tag(&song.tags, "Album").unwrap_or_default(),
                    duration: song.duration,
                    file: song.file,
                })
            })
            .collect()
    }

    // The mpd crate exposes no command lists, so a batch is issued op by op
    // and stops at the first failure.
    fn batch(&mut self, ops: &[PlaylistOp]) -> Result<(), PlayerError> {
        for op in ops {
            match *op {
                PlaylistOp::Move { id, to } => self.client.shift(Id(id.0), to as usize)?,
                PlaylistOp::Delete { id } => self.client.delete(Id(id.0))?,
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PlayerError> {
        Ok(self.client.clear()?)
    }

    fn close(self) -> Result<(), PlayerError> {
        // Dropping the client closes the socket.
        drop(self.client);
        Ok(())
    }
}
