use crate::enums::RebalanceReason;
use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance within which target weights are accepted as summing to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A date-indexed table of prices, one column per asset.
///
/// Dates are strictly increasing. A `None` cell is a missing price; the
/// simulation never interpolates, so callers are expected to fill gaps
/// (see [`PriceTable::fill_gaps`]) before handing the table to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl PriceTable {
    /// Builds a table from columns that may contain gaps.
    pub fn with_gaps(
        dates: Vec<NaiveDate>,
        columns: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Result<Self, CoreError> {
        if let Some(pair) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(CoreError::InvalidInput(
                "dates".to_string(),
                format!("dates must be strictly increasing ({} followed by {})", pair[0], pair[1]),
            ));
        }

        for (asset, values) in &columns {
            if values.len() != dates.len() {
                return Err(CoreError::InvalidInput(
                    asset.clone(),
                    format!("column has {} values for {} dates", values.len(), dates.len()),
                ));
            }
        }

        // Non-finite cells are treated as missing.
        let columns = columns
            .into_iter()
            .map(|(asset, values)| {
                let cleaned = values.into_iter().map(|v| v.filter(|p| p.is_finite())).collect();
                (asset, cleaned)
            })
            .collect();

        Ok(Self { dates, columns })
    }

    /// Builds a table from fully populated columns. `NaN` marks a missing price.
    pub fn from_columns<I, S>(dates: Vec<NaiveDate>, columns: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|(asset, values)| (asset.into(), values.into_iter().map(Some).collect()))
            .collect();
        Self::with_gaps(dates, columns)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, asset: &str) -> Option<&[Option<f64>]> {
        self.columns.get(asset).map(Vec::as_slice)
    }

    pub fn price(&self, asset: &str, row: usize) -> Option<f64> {
        self.columns.get(asset).and_then(|c| c.get(row).copied().flatten())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of missing cells across all columns.
    pub fn missing_count(&self) -> usize {
        self.columns.values().flatten().filter(|v| v.is_none()).count()
    }

    /// Forward-fills every column, then back-fills any leading gap.
    /// A column with no observation at all is left untouched.
    pub fn fill_gaps(&mut self) {
        for values in self.columns.values_mut() {
            let mut last = None;
            for cell in values.iter_mut() {
                match cell {
                    Some(v) => last = Some(*v),
                    None => *cell = last,
                }
            }

            let mut next = None;
            for cell in values.iter_mut().rev() {
                match cell {
                    Some(v) => next = Some(*v),
                    None => *cell = next,
                }
            }
        }
    }

    /// Returns a copy restricted to rows dated on or after `cutoff`.
    pub fn since(&self, cutoff: NaiveDate) -> Self {
        let start = self.dates.partition_point(|d| *d < cutoff);
        Self {
            dates: self.dates[start..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(asset, values)| (asset.clone(), values[start..].to_vec()))
                .collect(),
        }
    }
}

/// Target allocation: asset identifier to a non-negative fraction summing to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct TargetWeights(BTreeMap<String, f64>);

impl TargetWeights {
    /// Validates the weights and normalises them if their sum is off by more
    /// than [`WEIGHT_SUM_TOLERANCE`].
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self, CoreError> {
        if weights.is_empty() {
            return Err(CoreError::InvalidWeights("no assets given".to_string()));
        }

        for (asset, w) in &weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(CoreError::InvalidWeights(format!(
                    "weight for '{}' must be a non-negative number, got {}",
                    asset, w
                )));
            }
        }

        let sum: f64 = weights.values().sum();
        if sum <= 0.0 {
            return Err(CoreError::InvalidWeights("weights sum to zero".to_string()));
        }

        if (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
            return Ok(Self(weights));
        }

        tracing::warn!(sum, "Target weights do not sum to 1. Normalizing.");
        let normalized: BTreeMap<String, f64> =
            weights.into_iter().map(|(a, w)| (a, w / sum)).collect();

        let check: f64 = normalized.values().sum();
        if (check - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::InvalidWeights(format!(
                "weights still sum to {} after normalization",
                check
            )));
        }

        Ok(Self(normalized))
    }

    pub fn get(&self, asset: &str) -> Option<f64> {
        self.0.get(asset).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(a, w)| (a.as_str(), *w))
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<String, f64>> for TargetWeights {
    type Error = CoreError;

    fn try_from(value: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetWeights> for BTreeMap<String, f64> {
    fn from(value: TargetWeights) -> Self {
        value.0
    }
}

/// A record of one rebalance, captured before capital was reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceEvent {
    pub date: NaiveDate,
    pub weights_before: BTreeMap<String, f64>,
    pub capital_before: f64,
    pub reason: RebalanceReason,
}

/// Portfolio value over time, normalised to a base of 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    points: Vec<(NaiveDate, f64)>,
}

impl EquityCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { points: Vec::with_capacity(capacity) }
    }

    /// Builds a curve from points, rejecting dates that are not strictly increasing.
    pub fn from_points(points: Vec<(NaiveDate, f64)>) -> Result<Self, CoreError> {
        if let Some(pair) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(CoreError::InvalidInput(
                "equity curve".to_string(),
                format!("dates must be strictly increasing ({} followed by {})", pair[0].0, pair[1].0),
            ));
        }
        Ok(Self { points })
    }

    /// Appends a point. Callers must push dates in increasing order.
    pub fn push(&mut self, date: NaiveDate, value: f64) {
        debug_assert!(self.points.last().is_none_or(|(d, _)| *d < date));
        self.points.push((date, value));
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Per-period percentage changes, each dated at the later of its two points.
    pub fn pct_change(&self) -> Vec<(NaiveDate, f64)> {
        self.points
            .windows(2)
            .map(|w| (w[1].0, w[1].1 / w[0].1 - 1.0))
            .collect()
    }
}
