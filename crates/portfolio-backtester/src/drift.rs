use crate::returns::ReturnSeriesBuilder;
use chrono::TimeDelta;
use core_types::{CoreError, DriftMode, FirstPeriodPolicy, PriceTable, TargetWeights};
use std::collections::BTreeMap;

/// Stand-in denominator for assets with a zero target in relative mode.
const ZERO_TARGET_FLOOR: f64 = 1e-9;

/// Deviation of each asset's weight from its target.
///
/// `current` is aligned to the target's assets (absent assets count as zero)
/// and renormalized to sum to one before comparing. In relative mode the
/// difference is divided by the target weight.
pub fn compute_drift(
    current: &BTreeMap<String, f64>,
    target: &TargetWeights,
    mode: DriftMode,
) -> BTreeMap<String, f64> {
    let aligned_sum: f64 = target
        .assets()
        .map(|a| current.get(a).copied().unwrap_or(0.0))
        .sum();

    target
        .iter()
        .map(|(asset, t)| {
            let c = current.get(asset).copied().unwrap_or(0.0);
            let c = if aligned_sum > 0.0 { c / aligned_sum } else { c };
            let diff = c - t;
            let drift = match mode {
                DriftMode::Absolute => diff,
                DriftMode::Relative => {
                    let denom = if t == 0.0 { ZERO_TARGET_FLOOR } else { t };
                    diff / denom
                }
            };
            (asset.to_string(), drift)
        })
        .collect()
}

/// Largest absolute drift across all assets, or 0.0 when there are none.
pub fn max_abs_drift(drift: &BTreeMap<String, f64>) -> f64 {
    drift.values().fold(0.0_f64, |acc, d| acc.max(d.abs()))
}

/// A snapshot of how far a portfolio has moved from its targets.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftReport {
    pub target: BTreeMap<String, f64>,
    pub current: BTreeMap<String, f64>,
    pub drift: BTreeMap<String, f64>,
    pub max_abs_drift: f64,
    pub threshold: f64,
    pub mode: DriftMode,
}

impl DriftReport {
    pub fn new(
        current: BTreeMap<String, f64>,
        target: &TargetWeights,
        threshold: f64,
        mode: DriftMode,
    ) -> Self {
        let drift = compute_drift(&current, target, mode);
        let max_abs_drift = max_abs_drift(&drift);
        Self {
            target: target.as_map().clone(),
            current,
            drift,
            max_abs_drift,
            threshold,
            mode,
        }
    }

    /// True when the largest drift strictly exceeds the threshold.
    pub fn breached(&self) -> bool {
        self.max_abs_drift > self.threshold
    }

    /// Estimates today's weights by letting a target-weighted portfolio drift
    /// over the last `window_days` calendar days of `prices`.
    ///
    /// The window ends at the last price row. Every target asset needs a full,
    /// gap-free price history within the window. A window longer than the
    /// calendar allows uses the whole table.
    pub fn from_prices(
        prices: &PriceTable,
        target: &TargetWeights,
        window_days: i64,
        threshold: f64,
        mode: DriftMode,
    ) -> Result<Self, CoreError> {
        let last = *prices.dates().last().ok_or(CoreError::InsufficientData {
            observations: 0,
            required: 2,
        })?;
        // A window reaching past the representable calendar covers everything.
        let window = match TimeDelta::try_days(window_days).and_then(|d| last.checked_sub_signed(d)) {
            Some(cutoff) => prices.since(cutoff),
            None => prices.clone(),
        };

        let returns = ReturnSeriesBuilder::new(FirstPeriodPolicy::Drop).build(&window, target.assets())?;

        let values: BTreeMap<String, f64> = target
            .iter()
            .map(|(asset, w)| {
                let growth: f64 = returns
                    .iter()
                    .map(|p| 1.0 + p.returns.get(asset).copied().unwrap_or(0.0))
                    .product();
                (asset.to_string(), w * growth)
            })
            .collect();

        let total: f64 = values.values().sum();
        let current = values.into_iter().map(|(a, v)| (a, v / total)).collect();

        tracing::info!(
            window_days,
            start = %window.dates()[0],
            end = %last,
            "Estimated current weights from recent prices."
        );

        Ok(Self::new(current, target, threshold, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn target() -> TargetWeights {
        TargetWeights::new([("A".to_string(), 0.5), ("B".to_string(), 0.5)].into()).unwrap()
    }

    #[test]
    fn test_absolute_and_relative_drift() {
        let current: BTreeMap<String, f64> =
            [("A".to_string(), 0.6), ("B".to_string(), 0.4)].into();

        let abs = compute_drift(&current, &target(), DriftMode::Absolute);
        assert_relative_eq!(abs["A"], 0.1, epsilon = 1e-12);
        assert_relative_eq!(abs["B"], -0.1, epsilon = 1e-12);

        let rel = compute_drift(&current, &target(), DriftMode::Relative);
        assert_relative_eq!(rel["A"], 0.2, epsilon = 1e-12);
        assert_relative_eq!(max_abs_drift(&rel), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_current_assets_count_as_zero() {
        let current: BTreeMap<String, f64> = [("A".to_string(), 1.0)].into();
        let drift = compute_drift(&current, &target(), DriftMode::Absolute);
        assert_relative_eq!(drift["B"], -0.5);
    }

    #[test]
    fn test_report_from_recent_prices() {
        let dates: Vec<NaiveDate> = (1..=5)
            .map(|d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap())
            .collect();
        let prices = PriceTable::from_columns(
            dates,
            [
                ("A", vec![50.0, 100.0, 110.0, 120.0, 150.0]),
                ("B", vec![100.0, 100.0, 100.0, 100.0, 100.0]),
            ],
        )
        .unwrap();

        // Window of 3 days keeps June 2..5: A grows 1.5x, B is flat.
        let report = DriftReport::from_prices(&prices, &target(), 3, 0.05, DriftMode::Absolute).unwrap();

        assert_relative_eq!(report.current["A"], 0.75 / 1.25, epsilon = 1e-12);
        assert_relative_eq!(report.drift["A"], 0.1, epsilon = 1e-12);
        assert!(report.breached());
    }

    #[test]
    fn test_oversized_window_uses_whole_table() {
        let dates: Vec<NaiveDate> = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap())
            .collect();
        let prices = PriceTable::from_columns(
            dates,
            [("A", vec![100.0, 150.0, 200.0]), ("B", vec![100.0, 100.0, 100.0])],
        )
        .unwrap();

        let huge = DriftReport::from_prices(&prices, &target(), 1_000_000_000, 0.05, DriftMode::Absolute)
            .unwrap();
        let max = DriftReport::from_prices(&prices, &target(), i64::MAX, 0.05, DriftMode::Absolute)
            .unwrap();
        let full = DriftReport::from_prices(&prices, &target(), 30, 0.05, DriftMode::Absolute).unwrap();

        assert_eq!(huge, full);
        assert_eq!(max, full);
        assert_relative_eq!(full.current["A"], 1.0 / 1.5, epsilon = 1e-12);
    }
}
