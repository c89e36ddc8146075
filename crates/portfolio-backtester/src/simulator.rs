use crate::allocator::CapitalAllocator;
use crate::error::BacktestError;
use crate::rebalance::{self, RebalanceDecision, RebalancePolicy, TriggerContext};
use crate::returns::{ReturnSeriesBuilder, ReturnTable};
use configuration::SimulationSettings;
use chrono::NaiveDate;
use core_types::{CoreError, EquityCurve, PriceTable, RebalanceEvent, TargetWeights};

/// Portfolio capital at the start of every simulation.
pub const INITIAL_CAPITAL: f64 = 1.0;

/// The output of a single simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub equity_curve: EquityCurve,
    pub rebalance_log: Vec<RebalanceEvent>,
}

/// Drives the per-period simulation of a target-weight portfolio.
///
/// With rebalancing enabled, per-asset capital compounds independently and is
/// reset to the targets whenever the rebalance trigger fires. With it
/// disabled, the equity curve is the cumulative product of the static-weight
/// blend of asset returns.
#[derive(Debug, Clone)]
pub struct BacktestSimulator {
    settings: SimulationSettings,
}

impl BacktestSimulator {
    /// Validates the settings and creates a simulator.
    pub fn new(settings: SimulationSettings) -> Result<Self, BacktestError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Runs the simulation over every row of `prices`.
    ///
    /// The equity curve starts at `INITIAL_CAPITAL` on the first price date
    /// and has one point per price row under either first-period policy.
    pub fn run(
        &self,
        prices: &PriceTable,
        weights: &TargetWeights,
    ) -> Result<BacktestResult, BacktestError> {
        let returns = ReturnSeriesBuilder::new(self.settings.first_period_policy)
            .build(prices, weights.assets())?;

        tracing::info!(
            assets = weights.len(),
            periods = returns.len(),
            rebalance_enabled = self.settings.rebalance_enabled,
            "Starting portfolio simulation."
        );

        let start = prices.dates()[0];
        let result = if self.settings.rebalance_enabled {
            self.run_rebalancing(start, &returns, weights)?
        } else {
            run_static(start, &returns, weights)?
        };

        if let Some((date, value)) = result.equity_curve.last() {
            tracing::info!(
                %date,
                final_value = value,
                rebalances = result.rebalance_log.len(),
                "Portfolio simulation complete."
            );
        }

        Ok(result)
    }

    fn run_rebalancing(
        &self,
        start: NaiveDate,
        returns: &ReturnTable,
        weights: &TargetWeights,
    ) -> Result<BacktestResult, BacktestError> {
        let policy = RebalancePolicy::from(&self.settings);
        let mut allocator = CapitalAllocator::new(weights, INITIAL_CAPITAL);
        let mut equity_curve = base_curve(start, returns);
        let mut rebalance_log = Vec::new();

        let Some(first) = returns.periods().first() else {
            return Ok(BacktestResult { equity_curve, rebalance_log });
        };
        let mut last_rebalance = first.date;

        for period in returns.iter() {
            allocator.apply_period_return(period)?;
            equity_curve.push(period.date, allocator.total());

            let current_weights = allocator.current_weights()?;
            let ctx = TriggerContext {
                current_weights: &current_weights,
                target_weights: weights,
                last_rebalance,
                date: period.date,
                capital: allocator.total(),
            };

            if let RebalanceDecision::Rebalance(event) = rebalance::evaluate(&ctx, &policy) {
                tracing::debug!(
                    date = %event.date,
                    reason = %event.reason,
                    capital = event.capital_before,
                    "Rebalancing to target weights."
                );
                rebalance_log.push(event);
                allocator.reset_to(weights);
                last_rebalance = period.date;
            }
        }

        Ok(BacktestResult { equity_curve, rebalance_log })
    }
}

/// A curve holding the base value on `start`, unless the return table
/// already has a (zero-return) row for that date.
fn base_curve(start: NaiveDate, returns: &ReturnTable) -> EquityCurve {
    let mut curve = EquityCurve::with_capacity(returns.len() + 1);
    if returns.periods().first().is_some_and(|p| p.date > start) {
        curve.push(start, INITIAL_CAPITAL);
    }
    curve
}

/// Buy-and-hold blend: each period's portfolio return is the target-weighted
/// sum of asset returns, compounded into the equity curve.
fn run_static(
    start: NaiveDate,
    returns: &ReturnTable,
    weights: &TargetWeights,
) -> Result<BacktestResult, BacktestError> {
    let mut equity_curve = base_curve(start, returns);
    let mut value = INITIAL_CAPITAL;

    for period in returns.iter() {
        let mut portfolio_return = 0.0;
        for (asset, w) in weights.iter() {
            let r = period.returns.get(asset).ok_or_else(|| CoreError::MissingPrice {
                asset: asset.to_string(),
                date: period.date,
            })?;
            portfolio_return += w * r;
        }
        value *= 1.0 + portfolio_return;
        equity_curve.push(period.date, value);
    }

    Ok(BacktestResult {
        equity_curve,
        rebalance_log: Vec::new(),
    })
}
