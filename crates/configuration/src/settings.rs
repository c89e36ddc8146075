use crate::error::ConfigError;
use core_types::{DriftMode, FirstPeriodPolicy, RebalanceFrequency};
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationSettings,
    pub metrics: MetricsSettings,
    pub logging: LoggingSettings,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

/// Contains parameters for the backtest simulation and its rebalancing policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// When false, the equity curve is a static-weight blend of asset returns.
    pub rebalance_enabled: bool,
    /// Maximum tolerated drift before a rebalance fires. 0.05 means 5 points
    /// in absolute mode, or 5% of the target weight in relative mode.
    pub drift_threshold: f64,
    pub drift_mode: DriftMode,
    pub rebalance_frequency: RebalanceFrequency,
    pub first_period_policy: FirstPeriodPolicy,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            rebalance_enabled: true,
            drift_threshold: 0.05,
            drift_mode: DriftMode::Absolute,
            rebalance_frequency: RebalanceFrequency::None,
            first_period_policy: FirstPeriodPolicy::Drop,
        }
    }
}

impl SimulationSettings {
    /// Settings for a plain buy-and-hold blend.
    pub fn static_weights() -> Self {
        Self {
            rebalance_enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.drift_threshold.is_nan() || self.drift_threshold < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "drift_threshold must be a non-negative number, got {}",
                self.drift_threshold
            )));
        }

        let drift_can_fire = self.drift_threshold.is_finite();
        let calendar_can_fire = self.rebalance_frequency != RebalanceFrequency::None;
        if self.rebalance_enabled && !drift_can_fire && !calendar_can_fire {
            return Err(ConfigError::ValidationError(
                "rebalancing is enabled but neither the drift nor the calendar trigger can fire"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// How the number of elapsed periods is measured when annualizing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElapsedBasis {
    /// Calendar days between the first and last observation.
    #[default]
    CalendarDays,
    /// Number of observations minus one.
    Observations,
}

/// Contains parameters for the performance metrics calculator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Annual risk-free rate, e.g. 0.11 for 11% a year.
    pub risk_free_rate: f64,
    /// 252 for daily data, 12 for monthly data.
    pub periods_per_year: u32,
    pub elapsed_basis: ElapsedBasis,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self::daily()
    }
}

impl MetricsSettings {
    pub fn daily() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: 252,
            elapsed_basis: ElapsedBasis::CalendarDays,
        }
    }

    pub fn monthly() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: 12,
            elapsed_basis: ElapsedBasis::Observations,
        }
    }

    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periods_per_year == 0 {
            return Err(ConfigError::ValidationError(
                "periods_per_year must be greater than 0".to_string(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        Ok(())
    }
}

/// Contains parameters for the tracing subscriber.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG` when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "wallet.log".to_string(),
        }
    }
}
