use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Not enough price observations: {observations} row(s), at least {required} required")]
    InsufficientData { observations: usize, required: usize },

    #[error("Missing price for asset '{asset}' on {date}")]
    MissingPrice { asset: String, date: NaiveDate },

    #[error("Asset '{0}' is not present in the price table")]
    UnknownAsset(String),

    #[error("Invalid target weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
