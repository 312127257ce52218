//! Client configuration.
//!
//! Values are layered, later sources overriding earlier ones:
//!
//! 1. Bundled defaults (`numerous.toml` at the workspace root)
//! 2. `~/.config/numerous/numerous.toml`
//! 3. `./numerous.toml`
//! 4. `NUMEROUS_*` environment variables, with `__` separating nested keys
//!    (`NUMEROUS_THROTTLE__VOLUNTARY_THRESHOLD=10`)
//!
//! The API key is deliberately not part of the file configuration; it is
//! passed to [`Connection::from_config`](crate::Connection::from_config).

use config::{Config, Environment, File, FileFormat};
use numerous_error::{ConfigError, NumerousError, NumerousResult};
use numerous_throttle::ThrottleConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default API host.
pub const DEFAULT_SERVER: &str = "api.numerousapp.com";

/// Default request-loop attempt ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const DEFAULT_CONFIG: &str = include_str!("../../../numerous.toml");

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_filter_duplicates() -> bool {
    true
}

fn default_response_time_window() -> usize {
    1
}

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API host name, without scheme
    #[serde(default = "default_server")]
    pub server: String,
    /// Attempt ceiling for one API call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Drop boundary duplicates in collections that produce them
    #[serde(default = "default_filter_duplicates")]
    pub filter_duplicates: bool,
    /// Number of recent response times kept in the statistics
    #[serde(default = "default_response_time_window")]
    pub response_time_window: usize,
    /// Settings for the default throttle policy
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            max_attempts: default_max_attempts(),
            filter_duplicates: default_filter_duplicates(),
            response_time_window: default_response_time_window(),
            throttle: ThrottleConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a single TOML file.
    ///
    /// Fields missing from the file take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> NumerousResult<Self> {
        debug!(path = %path.as_ref().display(), "Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .build()
            .map_err(|e| {
                NumerousError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                NumerousError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with full precedence (see module docs).
    ///
    /// # Errors
    ///
    /// Returns an error if a present source cannot be parsed or the merged
    /// result is invalid.
    pub fn load() -> NumerousResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/numerous/numerous.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("numerous").required(false))
            .add_source(
                Environment::with_prefix("NUMEROUS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .map_err(|e| {
                NumerousError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                NumerousError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        debug!(server = %config.server, max_attempts = config.max_attempts, "Configuration loaded");
        Ok(config)
    }

    /// Check the values for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty server name, a zero attempt ceiling or
    /// an invalid throttle table.
    pub fn validate(&self) -> NumerousResult<()> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::new("server must not be empty").into());
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::new("max_attempts must be at least 1").into());
        }
        self.throttle.validate()
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.server)
    }
}
