use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub mod user;

pub use user::UserConfig;

pub struct AppConfig;

impl AppConfig {
    pub fn get_config_dir() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("juke")
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file means defaults. A file that exists but does not parse
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<UserConfig> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::get_config_path);

        if !path.exists() {
            return Ok(UserConfig::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// The default configuration as it would appear on disk.
    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&UserConfig::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "host = \"music.lan\"\nreconnect_interval_secs = 5\n\n[poll]\nplaying_ms = 250"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.host, "music.lan");
        assert_eq!(config.port, 6600);
        assert_eq!(config.reconnect_interval_secs, Some(5));
        assert_eq!(config.poll.playing_ms, 250);
        assert_eq!(config.poll.stopped_ms, 1000);
        assert_eq!(config.cover_names[0], "cover.jpg");
    }

    #[test]
    fn test_malformed_file_names_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();

        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_generated_config_parses_back() {
        let text = AppConfig::default_toml().unwrap();
        let parsed: UserConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, UserConfig::default());
    }
}
