use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often the calendar trigger forces a rebalance.
///
/// Intervals are fixed day counts (a month is always 30 days), not true
/// calendar months. Historical rebalance timing depends on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceFrequency {
    #[default]
    None,
    Monthly,
    Quarterly,
    Yearly,
}

impl RebalanceFrequency {
    /// Minimum number of days between two calendar-triggered rebalances.
    pub fn interval_days(&self) -> Option<i64> {
        match self {
            RebalanceFrequency::None => None,
            RebalanceFrequency::Monthly => Some(30),
            RebalanceFrequency::Quarterly => Some(90),
            RebalanceFrequency::Yearly => Some(365),
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RebalanceFrequency::None => "none",
            RebalanceFrequency::Monthly => "monthly",
            RebalanceFrequency::Quarterly => "quarterly",
            RebalanceFrequency::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

impl FromStr for RebalanceFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(RebalanceFrequency::None),
            "monthly" | "m" => Ok(RebalanceFrequency::Monthly),
            "quarterly" | "q" => Ok(RebalanceFrequency::Quarterly),
            "yearly" | "y" => Ok(RebalanceFrequency::Yearly),
            other => Err(format!("unknown rebalance frequency '{}'", other)),
        }
    }
}

/// What the return series builder does with the first price row, which has
/// no previous price to divide by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstPeriodPolicy {
    #[default]
    Drop,
    Zero,
}

impl fmt::Display for FirstPeriodPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirstPeriodPolicy::Drop => f.write_str("drop"),
            FirstPeriodPolicy::Zero => f.write_str("zero"),
        }
    }
}

impl FromStr for FirstPeriodPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(FirstPeriodPolicy::Drop),
            "zero" => Ok(FirstPeriodPolicy::Zero),
            other => Err(format!("unknown first period policy '{}'", other)),
        }
    }
}

/// Whether drift is measured in weight points or relative to the target weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftMode {
    #[default]
    Absolute,
    Relative,
}

impl fmt::Display for DriftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftMode::Absolute => f.write_str("absolute"),
            DriftMode::Relative => f.write_str("relative"),
        }
    }
}

impl FromStr for DriftMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" => Ok(DriftMode::Absolute),
            "relative" => Ok(DriftMode::Relative),
            other => Err(format!("unknown drift mode '{}'", other)),
        }
    }
}

/// Which condition caused a rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceReason {
    Drift,
    Calendar,
    DriftAndCalendar,
}

impl RebalanceReason {
    pub fn from_flags(drift: bool, calendar: bool) -> Option<Self> {
        match (drift, calendar) {
            (true, true) => Some(RebalanceReason::DriftAndCalendar),
            (true, false) => Some(RebalanceReason::Drift),
            (false, true) => Some(RebalanceReason::Calendar),
            (false, false) => None,
        }
    }
}

impl fmt::Display for RebalanceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceReason::Drift => f.write_str("drift"),
            RebalanceReason::Calendar => f.write_str("calendar"),
            RebalanceReason::DriftAndCalendar => f.write_str("drift+calendar"),
        }
    }
}
