use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod overrides;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use overrides::SettingsOverrides;
pub use settings::{Config, ElapsedBasis, LoggingSettings, MetricsSettings, SimulationSettings};
pub use telemetry::init_logging;

/// Prefix of environment variables that override file settings,
/// e.g. `WALLET__SIMULATION__DRIFT_THRESHOLD=0.1`.
pub const ENV_PREFIX: &str = "WALLET";

/// Loads the application configuration.
///
/// Settings are layered: built-in defaults, then the optional TOML file at
/// `path` (a missing file is not an error), then `WALLET__*` environment
/// variables. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(false));
    }

    let builder = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    if let Err(e) = config.validate() {
        tracing::warn!(error = %e, "Rejected configuration.");
        return Err(e);
    }

    tracing::debug!(
        file = ?path,
        rebalance_enabled = config.simulation.rebalance_enabled,
        drift_threshold = config.simulation.drift_threshold,
        "Configuration loaded."
    );
    Ok(config)
}

/// Parses a configuration from TOML text. Environment variables are not consulted.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}
