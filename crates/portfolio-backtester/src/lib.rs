//! # Wallet Portfolio Backtester
//!
//! This crate simulates a multi-asset portfolio over historical prices and
//! keeps it near its target weights. Each run is a left fold over the return
//! series: per-asset capital compounds, the rebalance trigger inspects the
//! resulting weights, and capital is reset to the targets when it fires.
//!
//! ## Public API
//!
//! - `ReturnSeriesBuilder`: prices to per-period percentage returns.
//! - `CapitalAllocator`: per-asset capital under compounding.
//! - `rebalance::evaluate`: the pure drift/calendar decision.
//! - `BacktestSimulator`: the per-period loop producing the equity curve and log.
//! - `run_batch`: independent simulations in parallel.
//! - `DriftReport`: drift of current weights against targets.
//! - `ReturnTable::asset_stats` / `ReturnTable::correlation`: per-asset return statistics.

pub mod allocator;
pub mod batch;
pub mod drift;
pub mod error;
pub mod rebalance;
pub mod returns;
pub mod simulator;

pub use allocator::CapitalAllocator;
pub use batch::{BacktestJob, BatchOutcome, run_batch};
pub use drift::{DriftReport, compute_drift};
pub use error::BacktestError;
pub use rebalance::{RebalanceDecision, RebalancePolicy, TriggerContext};
pub use returns::{AssetStats, CorrelationMatrix, PeriodReturns, ReturnSeriesBuilder, ReturnTable};
pub use simulator::{BacktestResult, BacktestSimulator, INITIAL_CAPITAL};
