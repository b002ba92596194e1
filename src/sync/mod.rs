//! The control loop: one engine thread draining the request queue, one
//! poller task feeding it refresh ticks.

pub mod differ;
pub mod engine;
pub mod error;
pub mod poller;
pub mod rate;
pub mod request;

pub use differ::{PlaylistDiffer, PlaylistUpdate};
pub use engine::{seek_target, Engine, EngineConfig};
pub use error::{report, SyncError};
pub use rate::{PollIntervals, PollRate};
pub use request::{request_queue, ConnectionState, Request, RequestQueue, RequestSender};

use crate::display::DisplaySink;
use crate::player::Connector;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Start the engine on a blocking thread of the current runtime.
///
/// The engine runs until every clone of the returned sender is dropped,
/// then closes its connection and the returned handle completes.
pub fn spawn_engine<C>(
    connector: C,
    display: Arc<dyn DisplaySink>,
    config: EngineConfig,
) -> (RequestSender, JoinHandle<()>)
where
    C: Connector + 'static,
    C::Client: 'static,
{
    let (sender, queue) = request_queue();
    let engine = Engine::new(connector, display, config, &sender, Handle::current());
    let task = tokio::task::spawn_blocking(move || engine.run(queue));
    (sender, task)
}
