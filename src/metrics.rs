//! Derived display values computed from target history.
//!
//! Everything here is a pure function of the data model; nothing is cached.

use crate::db::{ProbeStatus, Target};
use serde::Serialize;

/// Number of most recent outcomes included in a latency trend.
pub const TREND_POINTS: usize = 20;

/// Status shown for a target, including the no-data state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrentStatus {
    Pending,
    Up,
    Down,
    Error,
}

impl From<ProbeStatus> for CurrentStatus {
    fn from(status: ProbeStatus) -> Self {
        match status {
            ProbeStatus::Up => CurrentStatus::Up,
            ProbeStatus::Down => CurrentStatus::Down,
            ProbeStatus::Error => CurrentStatus::Error,
        }
    }
}

/// One point of a latency trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyPoint {
    pub timestamp: i64,
    pub latency_ms: u64,
}

/// Per-target values for summary display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSummary {
    pub status: CurrentStatus,
    pub uptime: u32,
    pub latency_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub latency_trend: Vec<LatencyPoint>,
}

/// Fleet-wide values for the header display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub fleet_uptime: u32,
    pub target_count: usize,
    pub active_count: usize,
}

/// Status of the latest outcome, or `Pending` when there is none.
pub fn current_status(target: &Target) -> CurrentStatus {
    target
        .history
        .last()
        .map(|o| o.status.into())
        .unwrap_or(CurrentStatus::Pending)
}

/// Share of `UP` outcomes in the history; 100 when empty.
pub fn uptime_percent(target: &Target) -> u32 {
    let ups = target
        .history
        .iter()
        .filter(|o| o.status == ProbeStatus::Up)
        .count();
    percent(ups, target.history.len())
}

/// Share of targets currently `UP`; 100 for an empty fleet.
pub fn fleet_uptime_percent(targets: &[Target]) -> u32 {
    let ups = targets
        .iter()
        .filter(|t| current_status(t) == CurrentStatus::Up)
        .count();
    percent(ups, targets.len())
}

pub fn latest_latency_ms(target: &Target) -> Option<u64> {
    target.history.last().map(|o| o.latency_ms)
}

pub fn latest_status_code(target: &Target) -> Option<u16> {
    target.history.last().and_then(|o| o.status_code)
}

/// Latency of the most recent `points` outcomes, oldest first.
pub fn latency_trend(target: &Target, points: usize) -> Vec<LatencyPoint> {
    let skip = target.history.len().saturating_sub(points);
    target
        .history
        .iter()
        .skip(skip)
        .map(|o| LatencyPoint {
            timestamp: o.timestamp,
            latency_ms: o.latency_ms,
        })
        .collect()
}

pub fn summarize(target: &Target) -> TargetSummary {
    TargetSummary {
        status: current_status(target),
        uptime: uptime_percent(target),
        latency_ms: latest_latency_ms(target),
        status_code: latest_status_code(target),
        latency_trend: latency_trend(target, TREND_POINTS),
    }
}

pub fn fleet_summary(targets: &[Target]) -> FleetSummary {
    FleetSummary {
        fleet_uptime: fleet_uptime_percent(targets),
        target_count: targets.len(),
        active_count: targets.iter().filter(|t| t.is_active).count(),
    }
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 100;
    }
    (100.0 * part as f64 / whole as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Outcome;

    fn target_with(codes: &[Option<u16>]) -> Target {
        let mut target = Target::new("t1".into(), "API".into(), "https://example.com".into(), 30);
        for (i, code) in codes.iter().enumerate() {
            let ts = i as i64 * 1000;
            let outcome = match code {
                Some(code) => Outcome::response(ts, *code, 10 + i as u64),
                None => Outcome::error(ts, 5, "connection refused"),
            };
            target.history.append(outcome);
        }
        target
    }

    #[test]
    fn test_empty_history_is_pending_and_fully_up() {
        let target = target_with(&[]);
        assert_eq!(current_status(&target), CurrentStatus::Pending);
        assert_eq!(uptime_percent(&target), 100);
        assert_eq!(latest_latency_ms(&target), None);
        assert_eq!(latest_status_code(&target), None);
    }

    #[test]
    fn test_uptime_three_up_one_down() {
        let target = target_with(&[Some(200), Some(200), Some(500), Some(204)]);
        assert_eq!(uptime_percent(&target), 75);
    }

    #[test]
    fn test_uptime_rounds() {
        // 2 of 3 up: 66.67 rounds to 67
        let target = target_with(&[Some(200), None, Some(200)]);
        assert_eq!(uptime_percent(&target), 67);
    }

    #[test]
    fn test_current_status_follows_latest() {
        let target = target_with(&[Some(200), Some(200), None]);
        assert_eq!(current_status(&target), CurrentStatus::Error);

        let target = target_with(&[None, Some(404)]);
        assert_eq!(current_status(&target), CurrentStatus::Down);
        assert_eq!(latest_status_code(&target), Some(404));
        assert_eq!(latest_latency_ms(&target), Some(11));

        let target = target_with(&[None, None, Some(200)]);
        assert_eq!(current_status(&target), CurrentStatus::Up);
    }

    #[test]
    fn test_latest_values_absent_for_error() {
        let target = target_with(&[Some(200), None]);
        assert_eq!(latest_status_code(&target), None);
        assert_eq!(latest_latency_ms(&target), Some(5));
    }

    #[test]
    fn test_fleet_uptime() {
        assert_eq!(fleet_uptime_percent(&[]), 100);

        let fleet = vec![
            target_with(&[Some(200)]),
            target_with(&[Some(200), None]),
            target_with(&[]),
        ];
        // Only the first is currently up; pending counts against the fleet.
        assert_eq!(fleet_uptime_percent(&fleet), 33);
        assert_eq!(fleet_uptime_percent(&fleet[..1]), 100);
        assert_eq!(fleet_uptime_percent(&fleet[1..2]), 0);
    }

    #[test]
    fn test_latency_trend_takes_newest() {
        let codes: Vec<Option<u16>> = (0..30).map(|_| Some(200)).collect();
        let target = target_with(&codes);
        let trend = latency_trend(&target, TREND_POINTS);
        assert_eq!(trend.len(), TREND_POINTS);
        assert_eq!(trend.first().map(|p| p.timestamp), Some(10_000));
        assert_eq!(trend.last().map(|p| p.latency_ms), Some(39));

        let short = target_with(&[Some(200)]);
        assert_eq!(latency_trend(&short, TREND_POINTS).len(), 1);
    }

    #[test]
    fn test_fleet_summary_counts_active() {
        let mut paused = target_with(&[Some(200)]);
        paused.is_active = false;
        let fleet = vec![paused, target_with(&[Some(500)])];

        let summary = fleet_summary(&fleet);
        assert_eq!(summary.target_count, 2);
        assert_eq!(summary.active_count, 1);
        assert_eq!(summary.fleet_uptime, 50);
    }
}
