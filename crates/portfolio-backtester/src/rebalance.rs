//! The rebalance decision.
//!
//! Two independent conditions are OR-ed together: weight drift beyond a
//! threshold, and a fixed number of days elapsed since the last rebalance.
//! The decision is a pure function; the simulator owns the last-rebalance
//! date and performs the actual reset.

use crate::drift::compute_drift;
use chrono::NaiveDate;
use configuration::SimulationSettings;
use core_types::{DriftMode, RebalanceEvent, RebalanceFrequency, RebalanceReason, TargetWeights};
use std::collections::BTreeMap;

/// The parts of the simulation settings the trigger looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalancePolicy {
    pub drift_threshold: f64,
    pub drift_mode: DriftMode,
    pub frequency: RebalanceFrequency,
}

impl From<&SimulationSettings> for RebalancePolicy {
    fn from(settings: &SimulationSettings) -> Self {
        Self {
            drift_threshold: settings.drift_threshold,
            drift_mode: settings.drift_mode,
            frequency: settings.rebalance_frequency,
        }
    }
}

/// Everything the trigger needs to know about the current period.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext<'a> {
    pub current_weights: &'a BTreeMap<String, f64>,
    pub target_weights: &'a TargetWeights,
    pub last_rebalance: NaiveDate,
    pub date: NaiveDate,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RebalanceDecision {
    Hold,
    Rebalance(RebalanceEvent),
}

/// True if any asset's drift strictly exceeds the threshold.
pub fn drift_triggered(ctx: &TriggerContext<'_>, policy: &RebalancePolicy) -> bool {
    compute_drift(ctx.current_weights, ctx.target_weights, policy.drift_mode)
        .values()
        .any(|d| d.abs() > policy.drift_threshold)
}

/// True if the configured interval has fully elapsed since the last rebalance.
pub fn calendar_triggered(ctx: &TriggerContext<'_>, policy: &RebalancePolicy) -> bool {
    match policy.frequency.interval_days() {
        Some(days) => (ctx.date - ctx.last_rebalance).num_days() >= days,
        None => false,
    }
}

/// Decides whether to rebalance in the current period.
///
/// On `Rebalance` the returned event carries the pre-reset weights and
/// capital, ready to be appended to the log.
pub fn evaluate(ctx: &TriggerContext<'_>, policy: &RebalancePolicy) -> RebalanceDecision {
    let drift = drift_triggered(ctx, policy);
    let calendar = calendar_triggered(ctx, policy);

    match RebalanceReason::from_flags(drift, calendar) {
        Some(reason) => RebalanceDecision::Rebalance(RebalanceEvent {
            date: ctx.date,
            weights_before: ctx.current_weights.clone(),
            capital_before: ctx.capital,
            reason,
        }),
        None => RebalanceDecision::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetWeights {
        TargetWeights::new([("A".to_string(), 0.5), ("B".to_string(), 0.5)].into()).unwrap()
    }

    fn weights(a: f64) -> BTreeMap<String, f64> {
        [("A".to_string(), a), ("B".to_string(), 1.0 - a)].into()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn policy(frequency: RebalanceFrequency) -> RebalancePolicy {
        RebalancePolicy {
            drift_threshold: 0.05,
            drift_mode: DriftMode::Absolute,
            frequency,
        }
    }

    #[test]
    fn test_hold_within_tolerance() {
        let target = target();
        let current = weights(0.54);
        let ctx = TriggerContext {
            current_weights: &current,
            target_weights: &target,
            last_rebalance: day(1),
            date: day(20),
            capital: 1.1,
        };
        assert_eq!(evaluate(&ctx, &policy(RebalanceFrequency::None)), RebalanceDecision::Hold);
    }

    #[test]
    fn test_drift_beyond_threshold_rebalances_with_payload() {
        let target = target();
        let current = weights(0.6);
        let ctx = TriggerContext {
            current_weights: &current,
            target_weights: &target,
            last_rebalance: day(1),
            date: day(3),
            capital: 1.2,
        };

        match evaluate(&ctx, &policy(RebalanceFrequency::None)) {
            RebalanceDecision::Rebalance(event) => {
                assert_eq!(event.date, day(3));
                assert_eq!(event.weights_before, current);
                assert_eq!(event.capital_before, 1.2);
                assert_eq!(event.reason, RebalanceReason::Drift);
            }
            RebalanceDecision::Hold => panic!("expected a rebalance"),
        }
    }

    #[test]
    fn test_calendar_fires_at_exactly_the_interval() {
        let target = target();
        let current = weights(0.5);
        let mut ctx = TriggerContext {
            current_weights: &current,
            target_weights: &target,
            last_rebalance: day(1),
            date: day(30),
            capital: 1.0,
        };
        let monthly = policy(RebalanceFrequency::Monthly);
        assert!(!calendar_triggered(&ctx, &monthly));

        ctx.date = day(31);
        assert!(calendar_triggered(&ctx, &monthly));
        match evaluate(&ctx, &monthly) {
            RebalanceDecision::Rebalance(event) => assert_eq!(event.reason, RebalanceReason::Calendar),
            RebalanceDecision::Hold => panic!("expected a calendar rebalance"),
        }
    }

    #[test]
    fn test_both_conditions_are_reported() {
        let target = target();
        let current = weights(0.7);
        let ctx = TriggerContext {
            current_weights: &current,
            target_weights: &target,
            last_rebalance: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            capital: 1.0,
        };
        match evaluate(&ctx, &policy(RebalanceFrequency::Yearly)) {
            RebalanceDecision::Rebalance(event) => {
                assert_eq!(event.reason, RebalanceReason::DriftAndCalendar)
            }
            RebalanceDecision::Hold => panic!("expected a rebalance"),
        }
    }

    #[test]
    fn test_no_calendar_trigger_without_frequency() {
        let target = target();
        let current = weights(0.5);
        let ctx = TriggerContext {
            current_weights: &current,
            target_weights: &target,
            last_rebalance: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            date: day(1),
            capital: 1.0,
        };
        assert!(!calendar_triggered(&ctx, &policy(RebalanceFrequency::None)));
    }
}
