//! Gate state, transitions and stats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Calls are admitted and failures are tracked in the rolling window
    #[default]
    Closed,
    /// Calls are rejected without running the operation
    Open,
    /// Calls are admitted to probe whether the dependency recovered
    HalfOpen,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        };
        f.write_str(label)
    }
}

/// A state change, reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: GateState,
    pub to: GateState,
    pub at: Instant,
}

/// Point-in-time view of a gate
#[derive(Debug, Clone, PartialEq)]
pub struct GateStats {
    pub name: String,
    pub state: GateState,
    /// Failures inside the rolling window
    pub failures: usize,
    /// Successes in the current half-open episode
    pub successes: u32,
    pub last_failure_at: Option<Instant>,
    pub last_success_at: Option<Instant>,
    /// Present only while open
    pub opened_at: Option<Instant>,
    /// Present only while open and representable as an `Instant`
    pub next_attempt_at: Option<Instant>,
    /// Calls that ran the operation
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    /// Calls turned away while open
    pub total_rejections: u64,
}

impl GateStats {
    /// Calculate failure rate as a percentage of admitted calls
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            (self.total_failures as f64 / self.total_calls as f64) * 100.0
        }
    }

    /// Render the stats relative to `now` for logs and admin endpoints
    pub fn report(&self, now: Instant) -> StatsReport {
        let age = |at: Option<Instant>| at.map(|at| millis(now.saturating_duration_since(at)));
        StatsReport {
            name: self.name.clone(),
            state: self.state,
            failures: self.failures,
            successes: self.successes,
            last_failure_ms_ago: age(self.last_failure_at),
            last_success_ms_ago: age(self.last_success_at),
            open_for_ms: age(self.opened_at),
            retry_after_ms: self
                .next_attempt_at
                .map(|next| millis(next.saturating_duration_since(now))),
            total_calls: self.total_calls,
            total_failures: self.total_failures,
            total_successes: self.total_successes,
            total_rejections: self.total_rejections,
            failure_rate: self.failure_rate(),
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Serializable rendering of [`GateStats`]
///
/// `Instant` has no wall-clock meaning, so timestamps become ages in
/// milliseconds measured when the report was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub name: String,
    pub state: GateState,
    pub failures: usize,
    pub successes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure_ms_ago: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success_ms_ago: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_for_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    pub total_rejections: u64,
    pub failure_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_stats(now: Instant) -> GateStats {
        GateStats {
            name: "payments".to_string(),
            state: GateState::Open,
            failures: 3,
            successes: 0,
            last_failure_at: Some(now - Duration::from_millis(200)),
            last_success_at: None,
            opened_at: Some(now - Duration::from_millis(200)),
            next_attempt_at: Some(now + Duration::from_millis(800)),
            total_calls: 4,
            total_failures: 3,
            total_successes: 1,
            total_rejections: 2,
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(GateState::Closed.to_string(), "closed");
        assert_eq!(GateState::HalfOpen.to_string(), "half_open");
        assert_eq!(GateState::default(), GateState::Closed);
    }

    #[test]
    fn test_failure_rate() {
        let now = Instant::now();
        let stats = open_stats(now);
        assert!((stats.failure_rate() - 75.0).abs() < f64::EPSILON);

        let idle = GateStats {
            total_calls: 0,
            total_failures: 0,
            ..stats
        };
        assert_eq!(idle.failure_rate(), 0.0);
    }

    #[test]
    fn test_report_renders_ages() {
        let now = Instant::now();
        let report = open_stats(now).report(now);

        assert_eq!(report.state, GateState::Open);
        assert_eq!(report.last_failure_ms_ago, Some(200));
        assert_eq!(report.open_for_ms, Some(200));
        assert_eq!(report.retry_after_ms, Some(800));
        assert_eq!(report.last_success_ms_ago, None);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "open");
        assert_eq!(json["retry_after_ms"], 800);
        assert!(json.get("last_success_ms_ago").is_none());
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
