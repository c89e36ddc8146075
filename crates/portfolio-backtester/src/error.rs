use chrono::NaiveDate;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Invalid input data: {0}")]
    Data(#[from] CoreError),

    #[error(
        "Total capital reached {total}{}; the portfolio is ruined",
        .date.map(|d| format!(" on {}", d)).unwrap_or_default()
    )]
    DegenerateCapital { total: f64, date: Option<NaiveDate> },

    #[error("Configuration error: {0}")]
    Configuration(#[from] configuration::error::ConfigError),
}
