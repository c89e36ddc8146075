use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The risk and performance metrics of one equity curve.
///
/// Every ratio is an `Option`: `None` means the metric is undefined for this
/// curve (zero denominator, too few observations, or no benchmark).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Number of points in the equity curve.
    pub observations: usize,

    // I. Return
    pub total_return: f64,
    pub annualized_return: Option<f64>,

    // II. Risk
    pub volatility: Option<f64>,
    pub max_drawdown: f64,

    // III. Risk-adjusted
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub calmar_ratio: Option<f64>,

    // IV. Relative to benchmark
    pub tracking_error: Option<f64>,
    pub information_ratio: Option<f64>,
    /// Sample covariance with the benchmark over the benchmark's sample variance.
    pub beta: Option<f64>,
}

impl PerformanceReport {
    /// The metrics as display-name / value pairs, in report order.
    pub fn entries(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("Total Return", Some(self.total_return)),
            ("Annualized Return", self.annualized_return),
            ("Volatility", self.volatility),
            ("Sharpe", self.sharpe_ratio),
            ("Sortino", self.sortino_ratio),
            ("Max Drawdown", Some(self.max_drawdown)),
            ("Calmar", self.calmar_ratio),
            ("Tracking Error", self.tracking_error),
            ("Information Ratio", self.information_ratio),
            ("Beta", self.beta),
        ]
    }
}
