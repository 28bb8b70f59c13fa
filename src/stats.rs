//! Drill counts by status.
//!
//! Scope-agnostic: callers choose which records go in.

use serde::Serialize;

use crate::models::{DrillRecord, DrillStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillStats {
    pub total_drills: u32,
    pub completed_drills: u32,
    pub scheduled_drills: u32,
    pub missed_drills: u32,
    /// Whole percent of completed drills, 0 when there are none
    pub success_rate: u32,
}

impl DrillStats {
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = DrillStatus>,
    {
        let mut stats = DrillStats::default();
        for status in statuses {
            stats.total_drills += 1;
            match status {
                DrillStatus::Completed => stats.completed_drills += 1,
                DrillStatus::Scheduled => stats.scheduled_drills += 1,
                DrillStatus::Missed => stats.missed_drills += 1,
            }
        }
        stats.success_rate = success_rate(stats.completed_drills, stats.total_drills);
        stats
    }
}

impl<'a> FromIterator<&'a DrillRecord> for DrillStats {
    fn from_iter<I: IntoIterator<Item = &'a DrillRecord>>(iter: I) -> Self {
        DrillStats::from_statuses(iter.into_iter().map(|d| d.status))
    }
}

/// `round(completed / total * 100)`, or 0 for an empty set
pub fn success_rate(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DrillStatus::*;

    #[test]
    fn test_empty_input() {
        let stats = DrillStats::from_statuses(Vec::<DrillStatus>::new());
        assert_eq!(stats, DrillStats::default());
        assert_eq!(stats.success_rate, 0);
    }

    #[test]
    fn test_three_of_four_completed() {
        let stats = DrillStats::from_statuses([Completed, Completed, Completed, Missed]);
        assert_eq!(stats.total_drills, 4);
        assert_eq!(stats.completed_drills, 3);
        assert_eq!(stats.missed_drills, 1);
        assert_eq!(stats.success_rate, 75);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(success_rate(1, 3), 33);
        assert_eq!(success_rate(2, 3), 67);
        assert_eq!(success_rate(1, 8), 13); // 12.5 rounds up
        assert_eq!(success_rate(5, 5), 100);
    }

    #[test]
    fn test_collect_from_records() {
        let mut done = DrillRecord::new("u", "A".into(), chrono::Utc::now());
        done.status = Completed;
        let pending = DrillRecord::new("u", "B".into(), chrono::Utc::now());

        let stats: DrillStats = [&done, &pending].into_iter().collect();
        assert_eq!(stats.scheduled_drills, 1);
        assert_eq!(stats.success_rate, 50);

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalDrills"], 2);
        assert_eq!(json["successRate"], 50);
    }
}
