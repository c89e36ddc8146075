use crate::error::BacktestError;
use crate::simulator::{BacktestResult, BacktestSimulator};
use configuration::SimulationSettings;
use core_types::{PriceTable, TargetWeights};
use rayon::prelude::*;

/// One independent simulation in a batch.
#[derive(Debug, Clone)]
pub struct BacktestJob<'a> {
    pub name: String,
    pub prices: &'a PriceTable,
    pub weights: TargetWeights,
    pub settings: SimulationSettings,
}

/// The result of one job, keyed by the job's name.
#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    pub result: Result<BacktestResult, BacktestError>,
}

/// Runs every job on the rayon thread pool.
///
/// Each job gets its own simulator and allocator; nothing mutable is shared.
/// A failing job does not stop the others. Outcomes keep the order of `jobs`.
pub fn run_batch<F>(jobs: &[BacktestJob<'_>], on_complete: F) -> Vec<BatchOutcome>
where
    F: Fn(&BatchOutcome) + Sync,
{
    tracing::info!(
        jobs = jobs.len(),
        threads = rayon::current_num_threads(),
        "Running backtest batch."
    );

    jobs.par_iter()
        .map(|job| {
            let result = BacktestSimulator::new(job.settings.clone())
                .and_then(|simulator| simulator.run(job.prices, &job.weights));

            if let Err(e) = &result {
                tracing::warn!(job = %job.name, error = %e, "Backtest job failed.");
            }

            let outcome = BatchOutcome {
                name: job.name.clone(),
                result,
            };
            on_complete(&outcome);
            outcome
        })
        .collect()
}
