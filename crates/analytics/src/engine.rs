use crate::error::AnalyticsError;
use crate::report::PerformanceReport;
use crate::stats;
use chrono::NaiveDate;
use configuration::{ElapsedBasis, MetricsSettings};
use core_types::EquityCurve;
use std::collections::BTreeMap;

/// A stateless calculator for deriving performance metrics from an equity curve.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    settings: MetricsSettings,
}

impl AnalyticsEngine {
    pub fn new(settings: MetricsSettings) -> Result<Self, AnalyticsError> {
        settings
            .validate()
            .map_err(|e| AnalyticsError::InvalidParameters(e.to_string()))?;
        Ok(Self { settings })
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `equity_curve` - Portfolio value over time, at least two points.
    /// * `benchmark` - Optional reference curve. Benchmark-relative metrics
    ///   use only the return dates both curves share.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `PerformanceReport` or an `AnalyticsError`.
    pub fn calculate(
        &self,
        equity_curve: &EquityCurve,
        benchmark: Option<&EquityCurve>,
    ) -> Result<PerformanceReport, AnalyticsError> {
        validate_curve(equity_curve, "equity curve")?;
        let benchmark = match benchmark {
            Some(b) if b.len() < 2 => {
                tracing::warn!(
                    points = b.len(),
                    "Benchmark has too few points; relative metrics are undefined."
                );
                None
            }
            Some(b) => {
                validate_curve(b, "benchmark")?;
                Some(b)
            }
            None => None,
        };

        let ((start, first), (end, last)) = endpoints(equity_curve)?;
        let values = equity_curve.values();
        let returns: Vec<f64> = equity_curve.pct_change().into_iter().map(|(_, r)| r).collect();
        let scale = f64::from(self.settings.periods_per_year).sqrt();
        let rf = self.settings.risk_free_rate;

        let total_return = last / first - 1.0;
        let annualized_return = self.annualized_return(equity_curve)?;
        let volatility = stats::sample_std(&returns).and_then(|s| finite(s * scale));

        let sharpe_ratio = match (annualized_return, volatility) {
            (Some(ar), Some(vol)) if vol > 0.0 => finite((ar - rf) / vol),
            _ => None,
        };

        let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside = stats::sample_std(&negatives).map(|s| s * scale);
        let sortino_ratio = match (annualized_return, downside) {
            (Some(ar), Some(dd)) if dd > 0.0 => finite((ar - rf) / dd),
            _ => None,
        };

        let max_drawdown = stats::max_drawdown(&values);
        let calmar_ratio = match annualized_return {
            Some(ar) if max_drawdown < 0.0 => finite(ar / max_drawdown.abs()),
            _ => None,
        };

        let mut report = PerformanceReport {
            start,
            end,
            observations: equity_curve.len(),
            total_return,
            annualized_return,
            volatility,
            max_drawdown,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            tracking_error: None,
            information_ratio: None,
            beta: None,
        };

        if let Some(benchmark) = benchmark {
            self.calculate_relative(equity_curve, benchmark, &mut report)?;
        }

        tracing::debug!(
            observations = report.observations,
            total_return = report.total_return,
            max_drawdown = report.max_drawdown,
            benchmark = benchmark.is_some(),
            "Performance metrics calculated."
        );

        Ok(report)
    }

    /// Geometric annualisation of the total return over the curve's span.
    fn annualized_return(&self, curve: &EquityCurve) -> Result<Option<f64>, AnalyticsError> {
        let ((start, first), (end, last)) = endpoints(curve)?;
        let elapsed = match self.settings.elapsed_basis {
            ElapsedBasis::CalendarDays => (end - start).num_days() as f64,
            ElapsedBasis::Observations => (curve.len() - 1) as f64,
        };
        if elapsed <= 0.0 {
            return Ok(None);
        }
        let periods = f64::from(self.settings.periods_per_year);
        Ok(finite((last / first).powf(periods / elapsed) - 1.0))
    }

    /// Tracking error, information ratio and beta against the benchmark.
    fn calculate_relative(
        &self,
        equity_curve: &EquityCurve,
        benchmark: &EquityCurve,
        report: &mut PerformanceReport,
    ) -> Result<(), AnalyticsError> {
        let benchmark_returns: BTreeMap<NaiveDate, f64> =
            benchmark.pct_change().into_iter().collect();
        let (portfolio, reference): (Vec<f64>, Vec<f64>) = equity_curve
            .pct_change()
            .into_iter()
            .filter_map(|(date, r)| benchmark_returns.get(&date).map(|b| (r, *b)))
            .unzip();

        if portfolio.len() < 2 {
            tracing::warn!(
                aligned = portfolio.len(),
                "Too few shared dates with the benchmark; relative metrics are undefined."
            );
            return Ok(());
        }

        let scale = f64::from(self.settings.periods_per_year).sqrt();
        let active: Vec<f64> = portfolio.iter().zip(&reference).map(|(p, b)| p - b).collect();
        report.tracking_error = stats::sample_std(&active).and_then(|s| finite(s * scale));

        let benchmark_return = self.annualized_return(benchmark)?;
        report.information_ratio = match (report.annualized_return, benchmark_return, report.tracking_error) {
            (Some(ar), Some(bar), Some(te)) if te > 0.0 => finite((ar - bar) / te),
            _ => None,
        };

        // Sample covariance over sample variance; a population variance
        // denominator would scale beta by n / (n - 1).
        report.beta = match (
            stats::sample_covariance(&portfolio, &reference),
            stats::sample_variance(&reference),
        ) {
            (Some(cov), Some(var)) if var > 0.0 => finite(cov / var),
            _ => None,
        };

        Ok(())
    }
}

fn validate_curve(curve: &EquityCurve, label: &str) -> Result<(), AnalyticsError> {
    if curve.len() < 2 {
        return Err(AnalyticsError::NotEnoughData(format!(
            "{} has {} point(s), at least 2 are required",
            label,
            curve.len()
        )));
    }
    if let Some((date, value)) = curve
        .points()
        .iter()
        .find(|(_, v)| !v.is_finite() || *v <= 0.0)
    {
        return Err(AnalyticsError::InvalidEquityCurve(format!(
            "{} value {} on {} is not a positive finite number",
            label, value, date
        )));
    }
    Ok(())
}

fn endpoints(
    curve: &EquityCurve,
) -> Result<((NaiveDate, f64), (NaiveDate, f64)), AnalyticsError> {
    match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => Ok((first, last)),
        _ => Err(AnalyticsError::NotEnoughData("equity curve is empty".to_string())),
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
