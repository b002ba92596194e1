use crate::artwork::ArtworkLocator;
use crate::sync::{EngineConfig, PollIntervals};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User-editable configuration, stored in `config.toml`. Never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_music_dir")]
    pub music_directory: String,
    /// Tried in order in each song's directory.
    #[serde(default = "default_cover_names")]
    pub cover_names: Vec<String>,
    /// Ask for a reconnect this often while running. Off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_interval_secs: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub poll: PollIntervals,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6600
}

fn default_music_dir() -> String {
    let home = dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    format!("{}/Music", home)
}

fn default_cover_names() -> Vec<String> {
    ["cover.jpg", "cover.jpeg", "cover.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            music_directory: default_music_dir(),
            cover_names: default_cover_names(),
            reconnect_interval_secs: None,
            log_level: default_log_level(),
            log_file: None,
            poll: PollIntervals::default(),
        }
    }
}

impl UserConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            intervals: self.poll,
            artwork: ArtworkLocator::new(&self.music_directory, self.cover_names.clone()),
        }
    }
}
