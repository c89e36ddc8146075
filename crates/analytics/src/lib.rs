//! # Wallet Analytics Engine
//!
//! This crate turns an equity curve into the standard set of risk and
//! performance metrics, optionally against a benchmark curve.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** depends only on `core-types` and the metric settings in
//!   `configuration`. No I/O.
//! - **Stateless calculation:** the `AnalyticsEngine` holds only its settings.
//!   It takes equity curves in and produces a `PerformanceReport`.
//! - **Undefined is not zero:** a metric whose denominator vanishes is `None`.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the calculator.
//! - `PerformanceReport`: the named metrics of one curve.
//! - `AnalyticsError`: the error types returned from this crate.

pub mod engine;
pub mod error;
pub mod report;
pub mod stats;

pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::PerformanceReport;
