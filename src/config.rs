//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the console looks for its JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/console.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LOTTERY_CONSOLE_CONFIG_PATH";
/// Environment variable overriding [`AppConfig::api_base_url`].
const BASE_URL_ENV: &str = "LOTTERY_API_BASE_URL";
/// Environment variable overriding [`AppConfig::session_file`].
const SESSION_FILE_ENV: &str = "LOTTERY_SESSION_FILE";

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_SESSION_FILE: &str = "data/session.json";
const DEFAULT_PRIZE_NAME: &str = "New prize";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_REDIRECT_DELAY_MS: u64 = 2_000;
const DEFAULT_NOTICE_CAPACITY: usize = 32;

/// Immutable runtime configuration shared across the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Root of the activity service, e.g. `https://host/api`.
    pub api_base_url: String,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// File backing the durable session fields.
    pub session_file: PathBuf,
    /// Pause before leaving for the home view after a failed bootstrap.
    pub redirect_delay: Duration,
    /// Name given to prizes created from the console.
    pub default_prize_name: String,
    /// Buffer size of the notice channel.
    pub notice_capacity: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults,
    /// then apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded console config");
                    raw.into()
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
        };
        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(base_url) = non_empty_env(BASE_URL_ENV) {
            self.api_base_url = base_url;
        }
        if let Some(session_file) = non_empty_env(SESSION_FILE_ENV) {
            self.session_file = PathBuf::from(session_file);
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

/// JSON representation of the configuration file; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    api_base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    session_file: Option<String>,
    redirect_delay_ms: Option<u64>,
    default_prize_name: Option<String>,
    notice_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            api_base_url: raw
                .api_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_millis(
                raw.request_timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
            session_file: PathBuf::from(
                raw.session_file
                    .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string()),
            ),
            redirect_delay: Duration::from_millis(
                raw.redirect_delay_ms.unwrap_or(DEFAULT_REDIRECT_DELAY_MS),
            ),
            default_prize_name: raw
                .default_prize_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_PRIZE_NAME.to_string()),
            notice_capacity: raw
                .notice_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_NOTICE_CAPACITY),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}
