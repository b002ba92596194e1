use clap::Parser;
use std::path::PathBuf;

/// Juke - a small MPD client that keeps its view in step with the daemon
#[derive(Parser, Debug)]
#[command(name = "juke", version, about)]
pub struct Args {
    /// MPD host (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// MPD port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Use the built-in demo player instead of a real MPD
    #[arg(long)]
    pub demo: bool,

    /// Generate default config.toml to stdout
    #[arg(long)]
    pub generate_config: bool,
}
