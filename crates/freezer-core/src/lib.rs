pub mod config;
pub mod error;

pub use config::{AlertsConfig, Config, LocationConfig, ValidationResult, WeatherConfig};
pub use error::{
    AppError, ConfigError, LocationError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
    StorageError, WeatherError,
};

use anyhow::Result;

/// Initialize logging. Safe to call more than once.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Freezer core initialized");
    }
    Ok(())
}
