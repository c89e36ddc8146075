//! Terminal tables and file exports.

use analytics::PerformanceReport;
use anyhow::{Context, Result};
use comfy_table::Table;
use core_types::{EquityCurve, RebalanceEvent};
use portfolio_backtester::{AssetStats, CorrelationMatrix, DriftReport};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "n/a".to_string(),
    }
}

pub fn metrics_table(report: &PerformanceReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    for (name, value) in report.entries() {
        table.add_row(vec![name.to_string(), format_metric(value)]);
    }
    table
}

/// One column per named report, metrics as rows.
pub fn comparison_table(reports: &[(String, PerformanceReport)]) -> Table {
    let mut table = Table::new();
    let mut header = vec!["Metric".to_string()];
    header.extend(reports.iter().map(|(name, _)| name.clone()));
    table.set_header(header);

    let rows: Vec<Vec<(&'static str, Option<f64>)>> =
        reports.iter().map(|(_, report)| report.entries()).collect();
    if let Some(first) = rows.first() {
        for (i, (metric, _)) in first.iter().enumerate() {
            let mut row = vec![metric.to_string()];
            row.extend(rows.iter().map(|entries| format_metric(entries[i].1)));
            table.add_row(row);
        }
    }
    table
}

pub fn drift_table(report: &DriftReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Asset", "Target", "Current", "Drift"]);
    for (asset, drift) in &report.drift {
        table.add_row(vec![
            asset.clone(),
            format!("{:.4}", report.target.get(asset).copied().unwrap_or(0.0)),
            format!("{:.4}", report.current.get(asset).copied().unwrap_or(0.0)),
            format!("{:+.4}", drift),
        ]);
    }
    table
}

pub fn asset_stats_table(stats: &BTreeMap<String, AssetStats>) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Asset", "Expected Return", "Volatility"]);
    for (asset, s) in stats {
        table.add_row(vec![
            asset.clone(),
            format_metric(s.expected_return),
            format_metric(s.volatility),
        ]);
    }
    table
}

pub fn correlation_table(matrix: &CorrelationMatrix) -> Table {
    let mut table = Table::new();
    let mut header = vec![String::new()];
    header.extend(matrix.assets.iter().cloned());
    table.set_header(header);
    for (asset, row) in matrix.assets.iter().zip(&matrix.values) {
        let mut cells = vec![asset.clone()];
        cells.extend(row.iter().map(|v| format_metric(*v)));
        table.add_row(cells);
    }
    table
}

pub fn write_equity_curve<W: Write>(curve: &EquityCurve, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["date", "value"])?;
    for (date, value) in curve.points() {
        writer.write_record([date.to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Rebalance log with one `weight_<asset>` column per asset.
pub fn write_rebalance_log<W: Write>(
    log: &[RebalanceEvent],
    assets: &[&str],
    writer: W,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut header = vec!["date".to_string(), "reason".to_string(), "capital_before".to_string()];
    header.extend(assets.iter().map(|a| format!("weight_{}", a)));
    writer.write_record(&header)?;

    for event in log {
        let mut record = vec![
            event.date.to_string(),
            event.reason.to_string(),
            event.capital_before.to_string(),
        ];
        record.extend(assets.iter().map(|a| {
            event
                .weights_before
                .get(*a)
                .map(|w| w.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json_report(report: &PerformanceReport, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

pub fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::RebalanceReason;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_equity_curve_csv() {
        let curve = EquityCurve::from_points(vec![(day(1), 1.0), (day(2), 1.5)]).unwrap();
        let mut buf = Vec::new();
        write_equity_curve(&curve, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "date,value\n2024-03-01,1\n2024-03-02,1.5\n");
    }

    #[test]
    fn test_rebalance_log_csv() {
        let log = vec![RebalanceEvent {
            date: day(5),
            weights_before: [("AAA".to_string(), 0.6), ("BBB".to_string(), 0.4)].into(),
            capital_before: 1.2,
            reason: RebalanceReason::Drift,
        }];
        let mut buf = Vec::new();
        write_rebalance_log(&log, &["AAA", "BBB"], &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,reason,capital_before,weight_AAA,weight_BBB"));
        assert_eq!(lines.next(), Some("2024-03-05,drift,1.2,0.6,0.4"));
    }

    #[test]
    fn test_correlation_table_lists_every_pair() {
        let matrix = CorrelationMatrix {
            assets: vec!["AAA".to_string(), "BBB".to_string()],
            values: vec![vec![Some(1.0), Some(-0.5)], vec![Some(-0.5), None]],
        };
        let rendered = correlation_table(&matrix).to_string();
        assert!(rendered.contains("-0.5000"));
        assert!(rendered.contains("n/a"));
        assert!(rendered.contains("BBB"));
    }

    #[test]
    fn test_undefined_metrics_render_as_na() {
        assert_eq!(format_metric(None), "n/a");
        assert_eq!(format_metric(Some(0.12345)), "0.1235");
    }
}
