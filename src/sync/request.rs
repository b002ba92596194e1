use crate::player::RowId;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tracing::debug;

/// Connection and playback state, owned by the engine alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Connected, waiting for the first poll to say what the player is doing.
    Unknown,
    Stopped,
    Paused,
    Playing,
}

impl ConnectionState {
    /// A track is loaded, either running or held.
    pub fn has_track(self) -> bool {
        matches!(self, ConnectionState::Playing | ConnectionState::Paused)
    }
}

/// A unit of intent for the engine. Requests are handled strictly one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Timer tick. Only the poller sends these; each one is answered with
    /// exactly one poll rate.
    PollRefresh,
    ConnectionRefresh,
    Next,
    Previous,
    PlayOrPause,
    Stop,
    /// A click at `x` on a progress bar `width` pixels wide.
    SeekAt { x: u32, width: u32 },
    ChangeTrack(RowId),
    SortPlaylist(Vec<RowId>),
    RemovePlaylist(Vec<RowId>),
    ClearPlaylist,
}

pub type RequestQueue = UnboundedReceiver<Request>;

/// Producer side of the request queue.
///
/// The queue closes once every `RequestSender` is dropped.
#[derive(Debug, Clone)]
pub struct RequestSender {
    tx: UnboundedSender<Request>,
}

impl RequestSender {
    /// Enqueue from a detached task, so the caller never waits on the engine.
    pub fn submit(&self, request: Request) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tx.send(request) {
                debug!("engine is gone, dropping {:?}", e.0);
            }
        });
    }

    /// Enqueue inline. Fails only when the engine has stopped.
    pub fn send(&self, request: Request) -> Result<(), Request> {
        self.tx.send(request).map_err(|e| e.0)
    }

    pub(crate) fn downgrade(&self) -> WeakUnboundedSender<Request> {
        self.tx.downgrade()
    }
}

pub fn request_queue() -> (RequestSender, RequestQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RequestSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_states() {
        assert!(!ConnectionState::Disconnected.has_track());
        assert!(!ConnectionState::Unknown.has_track());
        assert!(!ConnectionState::Stopped.has_track());
        assert!(ConnectionState::Paused.has_track());
        assert!(ConnectionState::Playing.has_track());
    }

    #[tokio::test]
    async fn test_submit_does_not_wait_for_consumer() {
        let (sender, mut queue) = request_queue();
        sender.submit(Request::Next);
        sender.submit(Request::Stop);

        let mut got = vec![queue.recv().await.unwrap(), queue.recv().await.unwrap()];
        got.sort_by_key(|r| format!("{:?}", r));
        assert_eq!(got, vec![Request::Next, Request::Stop]);
    }

    #[tokio::test]
    async fn test_queue_closes_with_last_sender() {
        let (sender, mut queue) = request_queue();
        let weak = sender.downgrade();
        sender.send(Request::ClearPlaylist).unwrap();
        drop(sender);

        assert_eq!(queue.recv().await, Some(Request::ClearPlaylist));
        assert_eq!(queue.recv().await, None);
        assert!(weak.upgrade().is_none());
    }
}
