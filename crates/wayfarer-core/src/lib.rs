pub mod config;
pub mod error;

pub use config::{
    Config, PreferencesConfig, SearchConfig, StorageBackend, StorageConfig, ValidationResult,
};
pub use error::{
    AppError, ConfigError, NetworkError, ReqwestErrorExt, RusqliteErrorExt, StorageError,
    ValidationError,
};

use anyhow::Result;

/// Initialize logging for the application
///
/// Logs go to stderr so stdout stays clean for command output.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("Wayfarer core initialized");
    Ok(())
}
