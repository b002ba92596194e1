use super::rate::{PollIntervals, RateReceiver};
use super::request::Request;
use tokio::sync::mpsc::WeakUnboundedSender;
use tracing::debug;

/// Asks the engine for a refresh, waits for the rate it answers with, sleeps, repeats.
///
/// The poller holds only a weak handle to the queue so it never keeps the
/// engine alive on its own.
pub struct Poller {
    requests: WeakUnboundedSender<Request>,
    rates: RateReceiver,
    intervals: PollIntervals,
}

impl Poller {
    pub fn new(
        requests: WeakUnboundedSender<Request>,
        rates: RateReceiver,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            requests,
            rates,
            intervals,
        }
    }

    pub async fn run(mut self) {
        debug!("poller started");
        loop {
            let Some(requests) = self.requests.upgrade() else {
                break;
            };
            if requests.send(Request::PollRefresh).is_err() {
                break;
            }
            drop(requests);

            let rate = self.rates.recv().await;
            match self.intervals.duration(rate) {
                Some(pause) => tokio::time::sleep(pause).await,
                None => break,
            }
        }
        debug!("poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::rate::{rate_channel, PollRate};
    use crate::sync::request::request_queue;
    use std::time::Duration;

    fn fast() -> PollIntervals {
        PollIntervals {
            playing_ms: 1,
            paused_ms: 1,
            stopped_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_each_rate_buys_one_refresh() {
        let (sender, mut queue) = request_queue();
        let (rates, rate_rx) = rate_channel();
        let task = tokio::spawn(Poller::new(sender.downgrade(), rate_rx, fast()).run());

        for rate in [PollRate::Fast, PollRate::Medium, PollRate::Slow] {
            assert_eq!(queue.recv().await, Some(Request::PollRefresh));
            // Nothing more until the rate is answered.
            assert!(queue.try_recv().is_err());
            assert!(rates.send(rate));
        }

        assert_eq!(queue.recv().await, Some(Request::PollRefresh));
        assert!(rates.send(PollRate::Stop));
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("poller should exit on Stop")
            .unwrap();
        assert!(queue.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_exits_when_queue_closes() {
        let (sender, mut queue) = request_queue();
        let (rates, rate_rx) = rate_channel();
        let task = tokio::spawn(Poller::new(sender.downgrade(), rate_rx, fast()).run());

        assert_eq!(queue.recv().await, Some(Request::PollRefresh));
        drop(sender);
        assert!(rates.send(PollRate::Fast));

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("poller should exit once the queue is closed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_exits_when_engine_drops_rate_sender() {
        let (sender, mut queue) = request_queue();
        let (rates, rate_rx) = rate_channel();
        let task = tokio::spawn(Poller::new(sender.downgrade(), rate_rx, fast()).run());

        assert_eq!(queue.recv().await, Some(Request::PollRefresh));
        drop(rates);

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("poller should exit when the rate channel closes")
            .unwrap();
    }
}
