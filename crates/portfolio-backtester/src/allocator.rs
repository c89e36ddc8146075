use crate::error::BacktestError;
use crate::returns::PeriodReturns;
use chrono::NaiveDate;
use core_types::{CoreError, TargetWeights};
use std::collections::BTreeMap;

/// Tracks how much capital sits in each asset as returns compound.
///
/// The sum of the per-asset capitals always equals `total()`. Assets are
/// processed in key order so results are reproducible to the last bit.
#[derive(Debug, Clone)]
pub struct CapitalAllocator {
    capital: BTreeMap<String, f64>,
    total: f64,
    as_of: Option<NaiveDate>,
}

impl CapitalAllocator {
    /// Splits `initial_capital` across assets according to `weights`.
    pub fn new(weights: &TargetWeights, initial_capital: f64) -> Self {
        let capital: BTreeMap<String, f64> = weights
            .iter()
            .map(|(asset, w)| (asset.to_string(), initial_capital * w))
            .collect();
        let total = capital.values().sum();
        Self { capital, total, as_of: None }
    }

    /// Compounds every asset's capital by its return for the period.
    pub fn apply_period_return(&mut self, period: &PeriodReturns) -> Result<(), BacktestError> {
        for (asset, capital) in self.capital.iter_mut() {
            let r = period.returns.get(asset).ok_or_else(|| CoreError::MissingPrice {
                asset: asset.clone(),
                date: period.date,
            })?;
            *capital *= 1.0 + r;
        }
        self.total = self.capital.values().sum();
        self.as_of = Some(period.date);
        Ok(())
    }

    /// Each asset's share of total capital.
    pub fn current_weights(&self) -> Result<BTreeMap<String, f64>, BacktestError> {
        if !self.total.is_finite() || self.total <= 0.0 {
            return Err(BacktestError::DegenerateCapital {
                total: self.total,
                date: self.as_of,
            });
        }
        Ok(self
            .capital
            .iter()
            .map(|(asset, c)| (asset.clone(), c / self.total))
            .collect())
    }

    /// Redistributes total capital so that weights match `weights` exactly.
    pub fn reset_to(&mut self, weights: &TargetWeights) {
        let total = self.total;
        for (asset, capital) in self.capital.iter_mut() {
            *capital = total * weights.get(asset).unwrap_or(0.0);
        }
        self.total = self.capital.values().sum();
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn capital(&self) -> &BTreeMap<String, f64> {
        &self.capital
    }

    /// Date of the last period applied, if any.
    pub fn as_of(&self) -> Option<NaiveDate> {
        self.as_of
    }
}
