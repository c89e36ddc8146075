//! CSV input for the command-line application.
//!
//! Prices are a wide table: a `date` column followed by one column per asset.
//! Empty cells are gaps. Weights are `asset,weight` rows. A benchmark is a
//! `date,value` series.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use core_types::{EquityCurve, PriceTable, TargetWeights};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

pub fn read_prices<R: Read>(reader: R) -> Result<PriceTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        bail!("price table needs a date column and at least one asset column");
    }
    let assets: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let date = parse_date(&record[0]).with_context(|| format!("price row {}", line + 1))?;
        let cells = assets
            .iter()
            .enumerate()
            .map(|(i, asset)| match record.get(i + 1).map(str::trim) {
                None | Some("") => Ok(None),
                Some(raw) => raw
                    .parse::<f64>()
                    .map(Some)
                    .with_context(|| format!("invalid price '{}' for {} on {}", raw, asset, date)),
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push((date, cells));
    }
    rows.sort_by_key(|(date, _)| *date);

    let dates = rows.iter().map(|(d, _)| *d).collect();
    let columns: BTreeMap<String, Vec<Option<f64>>> = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| (asset.clone(), rows.iter().map(|(_, cells)| cells[i]).collect()))
        .collect();

    Ok(PriceTable::with_gaps(dates, columns)?)
}

pub fn read_weights<R: Read>(reader: R) -> Result<TargetWeights> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut weights = BTreeMap::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 2 {
            bail!("weight rows must be 'asset,weight'");
        }
        let asset = record[0].trim().to_string();
        let weight: f64 = record[1]
            .trim()
            .parse()
            .with_context(|| format!("invalid weight '{}' for {}", &record[1], asset))?;
        if weights.insert(asset.clone(), weight).is_some() {
            bail!("asset {} is listed twice", asset);
        }
    }
    Ok(TargetWeights::new(weights)?)
}

pub fn read_benchmark<R: Read>(reader: R) -> Result<EquityCurve> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 2 {
            bail!("benchmark rows must be 'date,value'");
        }
        let date = parse_date(&record[0])?;
        let value: f64 = record[1]
            .trim()
            .parse()
            .with_context(|| format!("invalid benchmark value on {}", date))?;
        points.push((date, value));
    }
    points.sort_by_key(|(date, _)| *date);
    Ok(EquityCurve::from_points(points)?)
}

pub fn load_prices(path: &Path, fill_gaps: bool) -> Result<PriceTable> {
    let mut prices =
        read_prices(open(path)?).with_context(|| format!("reading prices from {}", path.display()))?;
    let missing = prices.missing_count();
    if fill_gaps && missing > 0 {
        tracing::info!(missing, "Filling price gaps.");
        prices.fill_gaps();
    }
    tracing::info!(
        rows = prices.len(),
        assets = prices.assets().count(),
        "Loaded price table."
    );
    Ok(prices)
}

pub fn load_weights(path: &Path) -> Result<TargetWeights> {
    read_weights(open(path)?).with_context(|| format!("reading weights from {}", path.display()))
}

pub fn load_benchmark(path: &Path) -> Result<EquityCurve> {
    read_benchmark(open(path)?).with_context(|| format!("reading benchmark from {}", path.display()))
}
