//! The engine-to-poller rate handoff.
//!
//! Parity rule: the engine sends exactly one rate for every `PollRefresh`
//! it handles, and the poller receives exactly one before it sleeps and
//! sends the next `PollRefresh`. So whenever the engine sends, the single
//! slot is empty. The only extra send is the `Stop` at shutdown.

use super::request::ConnectionState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollRate {
    Fast,
    Medium,
    Slow,
    /// The poller must exit.
    Stop,
}

impl PollRate {
    pub fn for_state(state: ConnectionState) -> PollRate {
        match state {
            ConnectionState::Playing => PollRate::Fast,
            ConnectionState::Paused => PollRate::Medium,
            ConnectionState::Stopped | ConnectionState::Unknown => PollRate::Slow,
            ConnectionState::Disconnected => PollRate::Stop,
        }
    }
}

/// How long each named rate sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollIntervals {
    #[serde(default = "default_playing_ms")]
    pub playing_ms: u64,
    #[serde(default = "default_paused_ms")]
    pub paused_ms: u64,
    #[serde(default = "default_stopped_ms")]
    pub stopped_ms: u64,
}

fn default_playing_ms() -> u64 {
    500
}

fn default_paused_ms() -> u64 {
    750
}

fn default_stopped_ms() -> u64 {
    1000
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            playing_ms: default_playing_ms(),
            paused_ms: default_paused_ms(),
            stopped_ms: default_stopped_ms(),
        }
    }
}

impl PollIntervals {
    /// `None` for `Stop`.
    pub fn duration(&self, rate: PollRate) -> Option<Duration> {
        let ms = match rate {
            PollRate::Fast => self.playing_ms,
            PollRate::Medium => self.paused_ms,
            PollRate::Slow => self.stopped_ms,
            PollRate::Stop => return None,
        };
        Some(Duration::from_millis(ms))
    }
}

/// Engine side of the handoff.
#[derive(Debug)]
pub struct RateSender {
    tx: mpsc::Sender<PollRate>,
}

/// Poller side of the handoff.
#[derive(Debug)]
pub struct RateReceiver {
    rx: mpsc::Receiver<PollRate>,
}

pub fn rate_channel() -> (RateSender, RateReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (RateSender { tx }, RateReceiver { rx })
}

impl RateSender {
    /// Answer one `PollRefresh`. Never blocks.
    ///
    /// Returns false if the poller is gone.
    pub fn send(&self, rate: PollRate) -> bool {
        match self.tx.try_send(rate) {
            Ok(()) => true,
            Err(TrySendError::Full(rate)) => {
                error!(
                    origin = "poll-rate",
                    "rate slot already full when sending {:?}; PollRefresh came from outside the poller",
                    rate
                );
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Tell the poller to exit. If it still has an unread rate it will exit
    /// on its own once the request queue is closed.
    pub fn stop(self) {
        let _ = self.tx.try_send(PollRate::Stop);
    }
}

impl RateReceiver {
    /// A closed channel reads as `Stop`.
    pub async fn recv(&mut self) -> PollRate {
        self.rx.recv().await.unwrap_or(PollRate::Stop)
    }

    #[cfg(test)]
    pub(crate) fn try_recv(&mut self) -> Option<PollRate> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_follows_state() {
        assert_eq!(PollRate::for_state(ConnectionState::Playing), PollRate::Fast);
        assert_eq!(PollRate::for_state(ConnectionState::Paused), PollRate::Medium);
        assert_eq!(PollRate::for_state(ConnectionState::Stopped), PollRate::Slow);
        assert_eq!(PollRate::for_state(ConnectionState::Disconnected), PollRate::Stop);
    }

    #[test]
    fn test_intervals() {
        let intervals = PollIntervals::default();
        assert_eq!(intervals.duration(PollRate::Fast), Some(Duration::from_millis(500)));
        assert_eq!(intervals.duration(PollRate::Medium), Some(Duration::from_millis(750)));
        assert_eq!(intervals.duration(PollRate::Slow), Some(Duration::from_millis(1000)));
        assert_eq!(intervals.duration(PollRate::Stop), None);
    }

    #[tokio::test]
    async fn test_one_send_per_receive_keeps_slot_free() {
        let (tx, mut rx) = rate_channel();
        for rate in [PollRate::Fast, PollRate::Medium, PollRate::Slow] {
            assert!(tx.send(rate));
            assert_eq!(rx.recv().await, rate);
        }
        assert!(tx.tx.capacity() == 1);
    }

    #[tokio::test]
    async fn test_second_send_without_receive_is_not_queued() {
        let (tx, mut rx) = rate_channel();
        assert!(tx.send(PollRate::Fast));
        assert!(tx.send(PollRate::Slow));

        assert_eq!(rx.recv().await, PollRate::Fast);
        assert!(rx.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_sender_reads_as_stop() {
        let (tx, mut rx) = rate_channel();
        drop(tx);
        assert_eq!(rx.recv().await, PollRate::Stop);
    }

    #[tokio::test]
    async fn test_send_to_gone_poller() {
        let (tx, rx) = rate_channel();
        drop(rx);
        assert!(!tx.send(PollRate::Fast));
    }
}
