pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{DriftMode, FirstPeriodPolicy, RebalanceFrequency, RebalanceReason};
pub use error::CoreError;
pub use structs::{EquityCurve, PriceTable, RebalanceEvent, TargetWeights, WEIGHT_SUM_TOLERANCE};
