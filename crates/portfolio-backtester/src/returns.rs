use chrono::NaiveDate;
use core_types::{CoreError, FirstPeriodPolicy, PriceTable};
use analytics::stats;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Percentage returns of every asset over one period, dated at the period's end.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReturns {
    pub date: NaiveDate,
    pub returns: BTreeMap<String, f64>,
}

/// The return series of a set of assets, one row per period in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnTable {
    periods: Vec<PeriodReturns>,
}

impl ReturnTable {
    pub(crate) fn from_periods(periods: Vec<PeriodReturns>) -> Self {
        Self { periods }
    }

    pub fn periods(&self) -> &[PeriodReturns] {
        &self.periods
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PeriodReturns> {
        self.periods.iter()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.periods.iter().map(|p| p.date).collect()
    }

    /// The return series of a single asset, or `None` if it was not built.
    pub fn column(&self, asset: &str) -> Option<Vec<f64>> {
        self.periods
            .iter()
            .map(|p| p.returns.get(asset).copied())
            .collect()
    }

    /// Assets present in every row, in key order.
    pub fn assets(&self) -> Vec<&str> {
        match self.periods.first() {
            Some(first) => first
                .returns
                .keys()
                .map(String::as_str)
                .filter(|a| self.periods.iter().all(|p| p.returns.contains_key(*a)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Annualized mean return and volatility of every asset.
    pub fn asset_stats(&self, periods_per_year: u32) -> BTreeMap<String, AssetStats> {
        let ppy = f64::from(periods_per_year);
        self.assets()
            .into_iter()
            .filter_map(|asset| {
                let column = self.column(asset)?;
                let stats = AssetStats {
                    expected_return: stats::mean(&column).map(|m| m * ppy).filter(|v| v.is_finite()),
                    volatility: stats::sample_std(&column)
                        .map(|s| s * ppy.sqrt())
                        .filter(|v| v.is_finite()),
                };
                Some((asset.to_string(), stats))
            })
            .collect()
    }

    /// Pairwise Pearson correlation of the asset return columns.
    pub fn correlation(&self) -> CorrelationMatrix {
        let assets: Vec<String> = self.assets().into_iter().map(str::to_string).collect();
        let columns: Vec<Vec<f64>> = assets
            .iter()
            .filter_map(|a| self.column(a))
            .collect();

        let values = columns
            .iter()
            .map(|xs| columns.iter().map(|ys| stats::correlation(xs, ys)).collect())
            .collect();

        CorrelationMatrix { assets, values }
    }
}

/// Per-asset return statistics on a yearly basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetStats {
    /// Mean period return times periods per year.
    pub expected_return: Option<f64>,
    /// Sample standard deviation times the square root of periods per year.
    pub volatility: Option<f64>,
}

/// Square correlation matrix; `None` where a column has no variance.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub assets: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.assets.iter().position(|x| x == a)?;
        let j = self.assets.iter().position(|x| x == b)?;
        self.values[i][j]
    }
}

/// Converts a price table into percentage-change rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnSeriesBuilder {
    policy: FirstPeriodPolicy,
}

impl ReturnSeriesBuilder {
    pub fn new(policy: FirstPeriodPolicy) -> Self {
        Self { policy }
    }

    /// Builds the return rows for `assets`.
    ///
    /// Every asset must have a positive price on every row of `prices`; other
    /// columns of the table are ignored. Asset columns are computed in
    /// parallel and then assembled into date-ordered rows.
    pub fn build<'a, I>(&self, prices: &PriceTable, assets: I) -> Result<ReturnTable, CoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if prices.len() < 2 {
            return Err(CoreError::InsufficientData {
                observations: prices.len(),
                required: 2,
            });
        }

        let assets: Vec<&str> = assets.into_iter().collect();
        let columns: Vec<(&str, Vec<f64>)> = assets
            .par_iter()
            .map(|asset| asset_returns(prices, asset).map(|r| (*asset, r)))
            .collect::<Result<_, _>>()?;

        let dates = prices.dates();
        let mut periods = Vec::with_capacity(dates.len());

        if self.policy == FirstPeriodPolicy::Zero {
            periods.push(PeriodReturns {
                date: dates[0],
                returns: assets.iter().map(|a| (a.to_string(), 0.0)).collect(),
            });
        }

        for (i, date) in dates.iter().enumerate().skip(1) {
            let returns = columns
                .iter()
                .map(|(asset, values)| (asset.to_string(), values[i - 1]))
                .collect();
            periods.push(PeriodReturns { date: *date, returns });
        }

        tracing::debug!(
            assets = assets.len(),
            periods = periods.len(),
            policy = %self.policy,
            "Built return series."
        );

        Ok(ReturnTable::from_periods(periods))
    }
}

/// Percentage changes of one asset's prices, validating every observation.
fn asset_returns(prices: &PriceTable, asset: &str) -> Result<Vec<f64>, CoreError> {
    let column = prices
        .column(asset)
        .ok_or_else(|| CoreError::UnknownAsset(asset.to_string()))?;

    let mut observed = Vec::with_capacity(column.len());
    for (cell, date) in column.iter().zip(prices.dates()) {
        let price = cell.ok_or_else(|| CoreError::MissingPrice {
            asset: asset.to_string(),
            date: *date,
        })?;
        if price <= 0.0 {
            return Err(CoreError::InvalidInput(
                asset.to_string(),
                format!("non-positive price {} on {}", price, date),
            ));
        }
        observed.push(price);
    }

    Ok(observed.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn table() -> PriceTable {
        PriceTable::from_columns(
            vec![d(1), d(2), d(3)],
            [("A", vec![100.0, 110.0, 99.0]), ("B", vec![50.0, 50.0, 55.0])],
        )
        .unwrap()
    }

    #[test]
    fn test_drop_policy_skips_first_row() {
        let returns = ReturnSeriesBuilder::new(FirstPeriodPolicy::Drop)
            .build(&table(), ["A", "B"])
            .unwrap();

        assert_eq!(returns.dates(), vec![d(2), d(3)]);
        let a = returns.column("A").unwrap();
        assert_relative_eq!(a[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(a[1], -0.1, epsilon = 1e-12);
        let b = returns.column("B").unwrap();
        assert_eq!(b[0], 0.0);
        assert_relative_eq!(b[1], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_policy_keeps_first_row_with_zero_returns() {
        let returns = ReturnSeriesBuilder::new(FirstPeriodPolicy::Zero)
            .build(&table(), ["A"])
            .unwrap();

        assert_eq!(returns.len(), 3);
        assert_eq!(returns.periods()[0].date, d(1));
        assert_eq!(returns.periods()[0].returns["A"], 0.0);
        assert!(returns.column("B").is_none());
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let prices = PriceTable::from_columns(vec![d(1)], [("A", vec![100.0])]).unwrap();
        let result = ReturnSeriesBuilder::default().build(&prices, ["A"]);
        assert_eq!(
            result,
            Err(CoreError::InsufficientData { observations: 1, required: 2 })
        );
    }

    #[test]
    fn test_missing_price_is_fatal() {
        let prices = PriceTable::from_columns(
            vec![d(1), d(2), d(3)],
            [("A", vec![100.0, f64::NAN, 101.0])],
        )
        .unwrap();
        let result = ReturnSeriesBuilder::default().build(&prices, ["A"]);
        assert_eq!(
            result,
            Err(CoreError::MissingPrice { asset: "A".to_string(), date: d(2) })
        );
    }

    #[test]
    fn test_asset_stats_are_annualized() {
        let returns = ReturnSeriesBuilder::default().build(&table(), ["A", "B"]).unwrap();
        let stats = returns.asset_stats(12);

        // A: +10%, -10%; B: 0%, +10%.
        assert_relative_eq!(stats["A"].expected_return.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(stats["B"].expected_return.unwrap(), 0.05 * 12.0, epsilon = 1e-12);
        let expected_vol = (0.02_f64).sqrt() * 12.0_f64.sqrt();
        assert_relative_eq!(stats["A"].volatility.unwrap(), expected_vol, epsilon = 1e-12);
    }

    #[test]
    fn test_correlation_matrix() {
        let prices = PriceTable::from_columns(
            vec![d(1), d(2), d(3), d(4)],
            [
                ("A", vec![100.0, 110.0, 99.0, 108.9]),
                ("B", vec![100.0, 90.0, 99.0, 89.1]),
                ("C", vec![10.0, 10.0, 10.0, 10.0]),
            ],
        )
        .unwrap();
        let returns = ReturnSeriesBuilder::default().build(&prices, ["A", "B", "C"]).unwrap();
        let corr = returns.correlation();

        assert_eq!(corr.assets, vec!["A", "B", "C"]);
        assert_relative_eq!(corr.get("A", "A").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(corr.get("A", "B").unwrap(), -1.0, epsilon = 1e-9);
        assert_eq!(corr.get("A", "C"), None);
        assert_eq!(corr.get("A", "Z"), None);
    }

    #[test]
    fn test_unknown_asset_and_bad_prices_are_rejected() {
        let result = ReturnSeriesBuilder::default().build(&table(), ["C"]);
        assert_eq!(result, Err(CoreError::UnknownAsset("C".to_string())));

        let prices =
            PriceTable::from_columns(vec![d(1), d(2)], [("A", vec![0.0, 1.0])]).unwrap();
        let result = ReturnSeriesBuilder::default().build(&prices, ["A"]);
        assert!(matches!(result, Err(CoreError::InvalidInput(_, _))));
    }
}
