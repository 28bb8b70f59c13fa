use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_TEAM_ID;
use crate::error::AppError;

/// Lifecycle state of a drill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillStatus {
    #[default]
    Scheduled,
    Completed,
    Missed,
}

impl DrillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrillStatus::Scheduled => "scheduled",
            DrillStatus::Completed => "completed",
            DrillStatus::Missed => "missed",
        }
    }
}

impl fmt::Display for DrillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrillStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(DrillStatus::Scheduled),
            "completed" => Ok(DrillStatus::Completed),
            "missed" => Ok(DrillStatus::Missed),
            other => Err(AppError::invalid(format!("Invalid drill status: {other}"))),
        }
    }
}

/// Who besides the owner may see a drill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    #[default]
    Team,
    Organization,
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "team" => Ok(Visibility::Team),
            "organization" => Ok(Visibility::Organization),
            other => Err(AppError::invalid(format!("Invalid visibility: {other}"))),
        }
    }
}

/// Effect of a status change on the owner's completed counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDelta {
    Gained,
    Lost,
    Unchanged,
}

/// Drill document stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillRecord {
    pub id: String,
    /// Secondary identifier kept for older clients
    pub drill_id: String,
    /// Owning user
    pub user_id: String,
    pub created_by: Option<String>,
    pub drill_name: String,
    pub scheduled_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub team_id: String,
    pub visibility: Visibility,
    pub status: DrillStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DrillRecord {
    /// A fresh `scheduled` drill owned by `user_id`
    pub fn new(user_id: &str, drill_name: String, scheduled_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            drill_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_by: None,
            drill_name,
            scheduled_date,
            completed_at: None,
            team_id: DEFAULT_TEAM_ID.to_string(),
            visibility: Visibility::default(),
            status: DrillStatus::Scheduled,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == DrillStatus::Completed
    }

    /// Move to `status`, stamping or clearing the completion time.
    ///
    /// Returns how the owner's `drills_completed` counter has to move.
    pub fn set_status(&mut self, status: DrillStatus, now: DateTime<Utc>) -> CompletionDelta {
        let old = self.status;
        self.status = status;

        if status == DrillStatus::Completed {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }

        match (old == DrillStatus::Completed, status == DrillStatus::Completed) {
            (false, true) => CompletionDelta::Gained,
            (true, false) => CompletionDelta::Lost,
            _ => CompletionDelta::Unchanged,
        }
    }
}

/// Drill as returned to clients.
///
/// `name`/`drillName` and `description`/`notes` carry the same values; both
/// spellings are part of the response contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub drill_name: String,
    pub scheduled_date: DateTime<Utc>,
    pub description: String,
    pub notes: String,
    pub status: DrillStatus,
    pub user_id: String,
    pub drill_id: String,
    pub team_id: String,
    pub created_by: Option<String>,
    pub visibility: Visibility,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DrillRecord> for DrillView {
    fn from(drill: &DrillRecord) -> Self {
        Self {
            id: drill.id.clone(),
            name: drill.drill_name.clone(),
            drill_name: drill.drill_name.clone(),
            scheduled_date: drill.scheduled_date,
            description: drill.notes.clone(),
            notes: drill.notes.clone(),
            status: drill.status,
            user_id: drill.user_id.clone(),
            drill_id: drill.drill_id.clone(),
            team_id: drill.team_id.clone(),
            created_by: drill.created_by.clone(),
            visibility: drill.visibility,
            completed_at: drill.completed_at,
            created_at: drill.created_at,
            updated_at: drill.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn drill() -> DrillRecord {
        let date = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        DrillRecord::new("owner", "Fire Evacuation Drill".to_string(), date)
    }

    #[test]
    fn test_new_drill_defaults() {
        let d = drill();
        assert_eq!(d.status, DrillStatus::Scheduled);
        assert_eq!(d.visibility, Visibility::Team);
        assert_eq!(d.team_id, DEFAULT_TEAM_ID);
        assert!(d.completed_at.is_none());
        assert_ne!(d.id, d.drill_id);
    }

    #[test]
    fn test_completion_stamps_timestamp_once() {
        let mut d = drill();
        let first = Utc.with_ymd_and_hms(2025, 3, 1, 11, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 3, 2, 11, 0, 0).unwrap();

        assert_eq!(d.set_status(DrillStatus::Completed, first), CompletionDelta::Gained);
        assert_eq!(d.completed_at, Some(first));

        // Completing again is idempotent for both timestamp and counter
        assert_eq!(
            d.set_status(DrillStatus::Completed, second),
            CompletionDelta::Unchanged
        );
        assert_eq!(d.completed_at, Some(first));
    }

    #[test]
    fn test_leaving_completed_clears_timestamp() {
        let mut d = drill();
        d.set_status(DrillStatus::Completed, Utc::now());
        assert_eq!(d.set_status(DrillStatus::Missed, Utc::now()), CompletionDelta::Lost);
        assert!(d.completed_at.is_none());
    }

    #[test]
    fn test_non_completed_transitions_leave_counter_alone() {
        let mut d = drill();
        assert_eq!(
            d.set_status(DrillStatus::Missed, Utc::now()),
            CompletionDelta::Unchanged
        );
        assert_eq!(
            d.set_status(DrillStatus::Scheduled, Utc::now()),
            CompletionDelta::Unchanged
        );
    }

    #[test]
    fn test_view_duplicates_aliased_fields() {
        let mut d = drill();
        d.notes = "North stairwell".to_string();
        let json = serde_json::to_value(DrillView::from(&d)).unwrap();

        assert_eq!(json["_id"], d.id.as_str());
        assert_eq!(json["name"], "Fire Evacuation Drill");
        assert_eq!(json["drillName"], "Fire Evacuation Drill");
        assert_eq!(json["description"], "North stairwell");
        assert_eq!(json["notes"], "North stairwell");
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["visibility"], "team");
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("missed".parse::<DrillStatus>().unwrap(), DrillStatus::Missed);
        assert!("done".parse::<DrillStatus>().is_err());
        assert_eq!(
            "organization".parse::<Visibility>().unwrap(),
            Visibility::Organization
        );
    }
}
