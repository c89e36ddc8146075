use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),

    #[error("Invalid equity curve: {0}")]
    InvalidEquityCurve(String),

    #[error("Invalid metric parameters: {0}")]
    InvalidParameters(String),
}
