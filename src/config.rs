//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PLAYKERS_BACK_CONFIG_PATH";

const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:5173";
const DEFAULT_INVITATION_TTL_HOURS: u64 = 168;
const DEFAULT_SSE_CAPACITY: usize = 16;
const DEFAULT_MAX_UPDATE_RETRIES: u32 = 5;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    public_base_url: String,
    invitation_ttl: Duration,
    sse_capacity: usize,
    max_update_retries: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        public_base_url = %app_config.public_base_url,
                        invitation_ttl_hours = app_config.invitation_ttl.as_secs() / 3600,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Origin of the web client, used to build invitation share links.
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// Lifetime of an invitation when the issuer does not pick one.
    pub fn invitation_ttl(&self) -> Duration {
        self.invitation_ttl
    }

    /// Buffer size of each per-match broadcast channel.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }

    /// Number of compare-and-set attempts made for an unversioned match update.
    pub fn max_update_retries(&self) -> u32 {
        self.max_update_retries
    }

    /// Override the public base URL, mostly useful in tests.
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_base_url: DEFAULT_PUBLIC_BASE_URL.into(),
            invitation_ttl: hours(DEFAULT_INVITATION_TTL_HOURS),
            sse_capacity: DEFAULT_SSE_CAPACITY,
            max_update_retries: DEFAULT_MAX_UPDATE_RETRIES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    public_base_url: Option<String>,
    invitation_ttl_hours: Option<u64>,
    sse_capacity: Option<usize>,
    max_update_retries: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            public_base_url: value
                .public_base_url
                .map(|url| url.trim_end_matches('/').to_owned())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.public_base_url),
            invitation_ttl: value
                .invitation_ttl_hours
                .filter(|hours| *hours > 0)
                .map(hours)
                .unwrap_or(defaults.invitation_ttl),
            sse_capacity: value
                .sse_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.sse_capacity),
            max_update_retries: value
                .max_update_retries
                .filter(|retries| *retries > 0)
                .unwrap_or(defaults.max_update_retries),
        }
    }
}

fn hours(count: u64) -> Duration {
    Duration::from_secs(count * 3600)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
