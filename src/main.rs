use anyhow::Result;
use clap::Parser;
use juke::app::cli::Args;
use juke::app::config::{AppConfig, UserConfig};
use juke::app::input::{parse_line, Input, HELP};
use juke::app::logging;
use juke::display::{ConsoleSink, DisplaySink, UiLock};
use juke::player::MemoryPlayer;
use juke::sync::{spawn_engine, EngineConfig, Request, RequestSender};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::info;

#[cfg(feature = "mpd")]
fn spawn_mpd(
    config: &UserConfig,
    display: Arc<dyn DisplaySink>,
    engine_config: EngineConfig,
) -> Result<(RequestSender, JoinHandle<()>)> {
    let connector = juke::player::MpdConnector::new(config.host.clone(), config.port);
    info!("using MPD at {}", connector.addr());
    Ok(spawn_engine(connector, display, engine_config))
}

#[cfg(not(feature = "mpd"))]
fn spawn_mpd(
    _config: &UserConfig,
    _display: Arc<dyn DisplaySink>,
    _engine_config: EngineConfig,
) -> Result<(RequestSender, JoinHandle<()>)> {
    anyhow::bail!("built without MPD support; run with --demo")
}

/// Caller-side reconnect. A refresh while connected does nothing.
async fn reconnect_every(requests: RequestSender, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if requests.send(Request::ConnectionRefresh).is_err() {
            break;
        }
    }
}

/// Read the console under the UI lock, off the async workers.
async fn render(console: &Arc<ConsoleSink>, view: fn(&ConsoleSink) -> String) -> Result<String> {
    let console = Arc::clone(console);
    let text = tokio::task::spawn_blocking(move || {
        let _ui = UiLock::acquire(&*console);
        view(&console)
    })
    .await?;
    Ok(text)
}

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();
    let args = Args::parse();

    if args.generate_config {
        println!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(log_file) = args.log_file {
        config.log_file = Some(log_file);
    }

    let _log_guard = logging::init(&config.log_level, config.log_file.as_deref())?;

    let console = Arc::new(ConsoleSink::stdout());
    let display: Arc<dyn DisplaySink> = console.clone();
    let engine_config = config.engine_config();

    let (requests, engine) = if args.demo {
        info!("using the demo player");
        spawn_engine(MemoryPlayer::demo(), display, engine_config)
    } else {
        spawn_mpd(&config, display, engine_config)?
    };

    requests.submit(Request::ConnectionRefresh);
    let reconnect = config
        .reconnect_interval_secs
        .filter(|&secs| secs > 0)
        .map(|secs| tokio::spawn(reconnect_every(requests.clone(), Duration::from_secs(secs))));

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(Input::Request(request))) => requests.submit(request),
            Ok(Some(Input::Status)) => println!("{}", render(&console, ConsoleSink::render_status).await?),
            Ok(Some(Input::List)) => println!("{}", render(&console, ConsoleSink::render_playlist).await?),
            Ok(Some(Input::Help)) => println!("{}", HELP),
            Ok(Some(Input::Quit)) => break,
            Err(e) => println!("{}", e),
        }
    }

    // The engine exits once the last sender is gone.
    if let Some(task) = reconnect {
        task.abort();
        let _ = task.await;
    }
    drop(requests);
    engine.await?;
    info!("bye");
    Ok(())
}
