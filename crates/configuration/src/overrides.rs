use crate::settings::Config;
use core_types::{DriftMode, FirstPeriodPolicy, RebalanceFrequency};

/// Command-line overrides layered on top of the loaded configuration.
///
/// With the `clap` feature enabled this derives `clap::Args` so a binary can
/// `#[command(flatten)]` it into its own argument structs.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct SettingsOverrides {
    /// Disable rebalancing and blend asset returns with static weights.
    #[cfg_attr(feature = "clap", arg(long))]
    pub no_rebalance: bool,

    /// Drift tolerance that triggers a rebalance (e.g. 0.05).
    #[cfg_attr(feature = "clap", arg(long))]
    pub drift_threshold: Option<f64>,

    /// Drift measurement: absolute or relative.
    #[cfg_attr(feature = "clap", arg(long))]
    pub drift_mode: Option<DriftMode>,

    /// Calendar rebalance interval: none, monthly, quarterly or yearly.
    #[cfg_attr(feature = "clap", arg(long))]
    pub frequency: Option<RebalanceFrequency>,

    /// First return row handling: drop or zero.
    #[cfg_attr(feature = "clap", arg(long))]
    pub first_period: Option<FirstPeriodPolicy>,

    /// Annual risk-free rate (e.g. 0.11).
    #[cfg_attr(feature = "clap", arg(long))]
    pub risk_free_rate: Option<f64>,

    /// Observations per year used for annualization (252 daily, 12 monthly).
    #[cfg_attr(feature = "clap", arg(long))]
    pub periods_per_year: Option<u32>,
}

impl SettingsOverrides {
    pub fn apply(&self, config: &mut Config) {
        if self.no_rebalance {
            config.simulation.rebalance_enabled = false;
        }
        if let Some(threshold) = self.drift_threshold {
            config.simulation.drift_threshold = threshold;
        }
        if let Some(mode) = self.drift_mode {
            config.simulation.drift_mode = mode;
        }
        if let Some(frequency) = self.frequency {
            config.simulation.rebalance_frequency = frequency;
        }
        if let Some(policy) = self.first_period {
            config.simulation.first_period_policy = policy;
        }
        if let Some(rate) = self.risk_free_rate {
            config.metrics.risk_free_rate = rate;
        }
        if let Some(periods) = self.periods_per_year {
            config.metrics.periods_per_year = periods;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_given_fields_are_overridden() {
        let mut config = Config::default();
        let overrides = SettingsOverrides {
            frequency: Some(RebalanceFrequency::Monthly),
            risk_free_rate: Some(0.11),
            ..Default::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.simulation.rebalance_frequency, RebalanceFrequency::Monthly);
        assert_eq!(config.metrics.risk_free_rate, 0.11);
        assert!(config.simulation.rebalance_enabled);
        assert_eq!(config.simulation.drift_threshold, 0.05);
    }

    #[test]
    fn test_no_rebalance_flag_disables_rebalancing() {
        let mut config = Config::default();
        SettingsOverrides { no_rebalance: true, ..Default::default() }.apply(&mut config);
        assert!(!config.simulation.rebalance_enabled);
    }
}
