pub mod config;
pub mod error;
pub mod view_state;

pub use config::{
    Config, LocationConfig, LocationMode, RacePolicy, ServiceConfig, ValidationResult, ViewConfig,
};
pub use error::{AppError, ConfigError, NetworkError, WeatherError};
pub use view_state::{ViewEvent, ViewState, LOCATION_DENIED};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize logging
///
/// `RUST_LOG` wins when set; otherwise `fallback_filter` is used. Output goes
/// to stderr so the rendered view on stdout stays readable.
pub fn init(fallback_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("SkyCast core initialized");
    Ok(())
}
