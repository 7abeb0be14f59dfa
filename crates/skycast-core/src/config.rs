use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use skycast_weather::location::DEFAULT_LOOKUP_URL;
use skycast_weather::provider::DEFAULT_BASE_URL;

/// Overrides `service.base_url` for one run; never written to disk.
pub const API_URL_ENV: &str = "SKYCAST_API_URL";

/// Timeouts above this are almost certainly a typo (minutes entered as seconds).
const MAX_SENSIBLE_TIMEOUT_SECS: u64 = 300;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// How the automatic lookup finds the device
    #[serde(default)]
    pub location: LocationConfig,

    /// Display behaviour
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the weather service; `/api/weather` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds. 0 waits for as long as the server takes.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl ServiceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    Fixed,
    #[default]
    IpLookup,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub mode: LocationMode,

    /// Used when `mode = "fixed"`
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,

    /// Used when `mode = "ip_lookup"`
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,
}

fn default_lookup_url() -> String {
    DEFAULT_LOOKUP_URL.to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            mode: LocationMode::default(),
            latitude: 0.0,
            longitude: 0.0,
            lookup_url: default_lookup_url(),
        }
    }
}

/// Which response wins when lookups overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RacePolicy {
    /// Only the most recently started lookup may change the view.
    #[default]
    LatestRequest,
    /// Whichever lookup finishes last overwrites the view.
    LastCompletion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub race_policy: RacePolicy,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            race_policy: RacePolicy::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there first if it is missing
    ///
    /// `SKYCAST_API_URL`, when set, replaces the stored base URL in memory only.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_override(path, std::env::var(API_URL_ENV).ok())
    }

    fn load_with_override(path: &Path, base_url: Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents).context("Failed to parse config file")?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            config
        };

        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            tracing::info!("Using weather service from {}: {}", API_URL_ENV, url);
            config.service.base_url = url;
        }

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        config.into_validated()
    }

    /// Validate an already loaded configuration, logging warnings
    pub fn into_validated(self) -> Result<(Self, ValidationResult)> {
        let validation = self.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.service.base_url, "service.base_url", &mut result);

        if self.service.timeout_secs > MAX_SENSIBLE_TIMEOUT_SECS {
            result.add_warning(
                "service.timeout_secs",
                format!(
                    "Timeout of {}s is unusually long",
                    self.service.timeout_secs
                ),
            );
        }

        match self.location.mode {
            LocationMode::Fixed => {
                if !(-90.0..=90.0).contains(&self.location.latitude) {
                    result.add_error("location.latitude", "Latitude must be within -90..=90");
                }
                if !(-180.0..=180.0).contains(&self.location.longitude) {
                    result.add_error("location.longitude", "Longitude must be within -180..=180");
                }
                if self.location.latitude == 0.0 && self.location.longitude == 0.0 {
                    result.add_warning(
                        "location",
                        "Fixed location is 0,0 - coordinates were probably not set",
                    );
                }
            }
            LocationMode::IpLookup => {
                validate_url(&self.location.lookup_url, "location.lookup_url", &mut result);
            }
            LocationMode::Disabled => {}
        }

        result
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }
            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
