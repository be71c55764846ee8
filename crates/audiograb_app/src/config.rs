use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use audiograb_core::DownloadTimings;
use audiograb_engine::ClientSettings;
use grab_logging::{grab_info, grab_warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "audiograb.ron";
pub const API_BASE_URL_ENV: &str = "AUDIOGRAB_API_BASE_URL";
pub const PASSWORD_ENV: &str = "AUDIOGRAB_PASSWORD";
const DEFAULT_OUTPUT_DIR: &str = "downloads";

/// Settings read from `audiograb.ron`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub username: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_bytes: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub release_grace_ms: Option<u64>,
}

impl AppConfig {
    /// Loads the configuration file.
    ///
    /// An explicit `path` must exist. The default file may be missing; a
    /// malformed file of either kind is logged and replaced by defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if !explicit && err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };

        Ok(Self::parse_or_default(&content, &path))
    }

    fn parse_or_default(content: &str, origin: &Path) -> Self {
        match ron::from_str(content) {
            Ok(config) => {
                grab_info!("Loaded config from {:?}", origin);
                config
            }
            Err(err) => {
                grab_warn!("Failed to parse config from {:?}: {}", origin, err);
                Self::default()
            }
        }
    }

    /// Applies `AUDIOGRAB_API_BASE_URL`, if set.
    pub fn apply_env(self) -> Self {
        self.with_base_url(std::env::var(API_BASE_URL_ENV).ok())
    }

    /// Replaces the base URL when `base_url` is non-blank.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.base_url = Some(url.trim().to_string());
        }
        self
    }

    pub fn client_settings(&self) -> ClientSettings {
        let defaults = ClientSettings::default();
        ClientSettings {
            base_url: self.base_url.clone().unwrap_or(defaults.base_url),
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            request_timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_bytes: self.max_bytes.unwrap_or(defaults.max_bytes),
        }
    }

    pub fn timings(&self) -> DownloadTimings {
        let defaults = DownloadTimings::default();
        DownloadTimings {
            settle_delay: self
                .settle_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            release_grace: self
                .release_grace_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.release_grace),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("audiograb.ron");
        fs::write(
            &path,
            r#"(base_url: Some("http://media.local:8080"), settle_delay_ms: Some(10))"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        let settings = config.client_settings();
        assert_eq!(settings.base_url, "http://media.local:8080");
        assert_eq!(settings.request_timeout, Duration::from_secs(300));
        assert_eq!(config.timings().settle_delay, Duration::from_millis(10));
        assert_eq!(config.timings().release_grace, Duration::from_millis(5000));
        assert_eq!(config.output_dir(), PathBuf::from("downloads"));
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.ron");
        fs::write(&path, "(base_url: ").unwrap();

        assert_eq!(AppConfig::load(Some(&path)).unwrap(), AppConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&temp.path().join("nope.ron"))).is_err());
    }

    #[test]
    fn blank_override_keeps_configured_url() {
        let config = AppConfig {
            base_url: Some("http://a".into()),
            ..AppConfig::default()
        };
        assert_eq!(
            config.clone().with_base_url(Some("  ".into())).base_url.as_deref(),
            Some("http://a")
        );
        assert_eq!(
            config.with_base_url(Some("http://b/".into())).base_url.as_deref(),
            Some("http://b/")
        );
    }

    #[test]
    fn defaults_match_client_defaults() {
        let settings = AppConfig::default().client_settings();
        assert_eq!(settings.base_url, "http://localhost:5000");
        assert_eq!(settings.max_bytes, 512 * 1024 * 1024);
    }
}
