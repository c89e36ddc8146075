//! Integration tests for the performance metrics.

use analytics::{AnalyticsEngine, AnalyticsError, PerformanceReport};
use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use configuration::MetricsSettings;
use core_types::EquityCurve;

fn dated(start: NaiveDate, values: &[f64]) -> EquityCurve {
    EquityCurve::from_points(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(i as i64), *v))
            .collect(),
    )
    .unwrap()
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
}

fn from_returns(start: NaiveDate, returns: &[f64]) -> EquityCurve {
    let mut values = vec![1.0];
    for r in returns {
        let last = *values.last().unwrap();
        values.push(last * (1.0 + r));
    }
    dated(start, &values)
}

fn six_day_report(benchmark: Option<&EquityCurve>) -> PerformanceReport {
    let curve = dated(jan(1), &[1.0, 1.02, 1.04, 1.03, 1.05, 1.06]);
    AnalyticsEngine::default().calculate(&curve, benchmark).unwrap()
}

#[test]
fn test_six_point_curve_metrics() {
    let report = six_day_report(None);

    assert_eq!(report.observations, 6);
    assert_eq!(report.start, jan(1));
    assert_eq!(report.end, jan(6));
    assert_relative_eq!(report.total_return, 0.06, epsilon = 1e-12);

    let annualized = 1.06_f64.powf(252.0 / 5.0) - 1.0;
    assert_relative_eq!(report.annualized_return.unwrap(), annualized, max_relative = 1e-9);

    assert_relative_eq!(report.max_drawdown, 1.03 / 1.04 - 1.0, epsilon = 1e-12);
    assert!(report.max_drawdown < 0.0);
    assert_relative_eq!(
        report.calmar_ratio.unwrap(),
        annualized / (1.0 - 1.03 / 1.04),
        max_relative = 1e-9
    );

    let vol = report.volatility.unwrap();
    assert!(vol > 0.0);
    assert_relative_eq!(report.sharpe_ratio.unwrap(), annualized / vol, max_relative = 1e-9);

    // A single negative return has no sample deviation.
    assert_eq!(report.sortino_ratio, None);
}

#[test]
fn test_missing_benchmark_leaves_relative_metrics_undefined() {
    let report = six_day_report(None);
    assert_eq!(report.tracking_error, None);
    assert_eq!(report.information_ratio, None);
    assert_eq!(report.beta, None);
}

#[test]
fn test_identical_benchmark_has_unit_beta_and_no_information_ratio() {
    let benchmark = dated(jan(1), &[1.0, 1.02, 1.04, 1.03, 1.05, 1.06]);
    let report = six_day_report(Some(&benchmark));

    assert_eq!(report.tracking_error, Some(0.0));
    assert_eq!(report.information_ratio, None);
    assert_relative_eq!(report.beta.unwrap(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_leveraged_portfolio_has_beta_two() {
    let base = [0.01, -0.02, 0.015, 0.005, -0.01];
    let doubled: Vec<f64> = base.iter().map(|r| 2.0 * r).collect();
    let benchmark = from_returns(jan(1), &base);
    let portfolio = from_returns(jan(1), &doubled);

    let report = AnalyticsEngine::default()
        .calculate(&portfolio, Some(&benchmark))
        .unwrap();

    assert_relative_eq!(report.beta.unwrap(), 2.0, epsilon = 1e-9);
    let te = report.tracking_error.unwrap();
    assert!(te > 0.0);

    let benchmark_report = AnalyticsEngine::default().calculate(&benchmark, None).unwrap();
    let expected_ir = (report.annualized_return.unwrap()
        - benchmark_report.annualized_return.unwrap())
        / te;
    assert_relative_eq!(report.information_ratio.unwrap(), expected_ir, max_relative = 1e-9);
}

#[test]
fn test_benchmark_is_aligned_by_date() {
    // The benchmark only starts on Jan 3, so only returns dated Jan 4..6 overlap.
    let benchmark = dated(jan(3), &[1.0, 0.99, 1.01, 1.0]);
    let report = six_day_report(Some(&benchmark));
    assert!(report.tracking_error.is_some());
    assert!(report.beta.is_some());

    // A single shared return date is too few for a sample deviation.
    let late = dated(jan(5), &[1.0, 1.01]);
    let report = six_day_report(Some(&late));
    assert_eq!(report.tracking_error, None);
    assert_eq!(report.beta, None);
}

#[test]
fn test_sortino_uses_downside_returns() {
    let curve = from_returns(jan(1), &[0.02, -0.01, 0.03, -0.02, 0.01]);
    let report = AnalyticsEngine::default().calculate(&curve, None).unwrap();

    let downside = {
        let negatives = [-0.01_f64, -0.02];
        let mean = negatives.iter().sum::<f64>() / 2.0;
        let var = negatives.iter().map(|r| (r - mean).powi(2)).sum::<f64>();
        var.sqrt() * 252.0_f64.sqrt()
    };
    assert_relative_eq!(
        report.sortino_ratio.unwrap(),
        report.annualized_return.unwrap() / downside,
        max_relative = 1e-9
    );
}

#[test]
fn test_risk_free_rate_lowers_sharpe() {
    let curve = from_returns(jan(1), &[0.001, -0.002, 0.003, 0.0005, 0.001, -0.001]);
    let plain = AnalyticsEngine::default().calculate(&curve, None).unwrap();
    let with_rf = AnalyticsEngine::new(MetricsSettings::daily().with_risk_free_rate(0.1))
        .unwrap()
        .calculate(&curve, None)
        .unwrap();

    let vol = plain.volatility.unwrap();
    assert_relative_eq!(
        plain.sharpe_ratio.unwrap() - with_rf.sharpe_ratio.unwrap(),
        0.1 / vol,
        max_relative = 1e-9
    );
}

#[test]
fn test_increasing_curve_has_positive_return_and_no_drawdown() {
    let curve = dated(jan(1), &[1.0, 1.01, 1.03, 1.06, 1.10]);
    let report = AnalyticsEngine::default().calculate(&curve, None).unwrap();
    assert!(report.total_return > 0.0);
    assert_eq!(report.max_drawdown, 0.0);
    assert_eq!(report.calmar_ratio, None);
}

#[test]
fn test_invalid_curve_is_rejected() {
    let result = AnalyticsEngine::default().calculate(&dated(jan(1), &[1.0, -0.5, 1.0]), None);
    assert!(matches!(result, Err(AnalyticsError::InvalidEquityCurve(_))));
}

#[test]
fn test_report_entries_and_serialization() {
    let report = six_day_report(None);
    let names: Vec<&str> = report.entries().iter().map(|(n, _)| *n).collect();
    assert_eq!(
        names,
        vec![
            "Total Return",
            "Annualized Return",
            "Volatility",
            "Sharpe",
            "Sortino",
            "Max Drawdown",
            "Calmar",
            "Tracking Error",
            "Information Ratio",
            "Beta",
        ]
    );

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["beta"].is_null());
    assert_eq!(json["observations"], 6);
}
