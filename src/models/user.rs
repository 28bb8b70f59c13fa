use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::drill::{CompletionDelta, DrillStatus};

/// Role of a user within their team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Member,
    TeamAdmin,
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(UserRole::Member),
            "team_admin" | "teamAdmin" => Ok(UserRole::TeamAdmin),
            other => Err(AppError::invalid(format!("Invalid role: {other}"))),
        }
    }
}

/// Legacy drill entry embedded in older user documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub drill_id: String,
    pub drill_name: String,
    pub scheduled_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub status: DrillStatus,
}

/// User document stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    /// Lower-cased, unique
    pub email: String,
    pub password_hash: String,
    pub organization: String,
    pub team_id: String,
    pub role: UserRole,
    pub total_drills: u32,
    pub drills_completed: u32,
    pub drill_history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        name: String,
        email: &str,
        password_hash: String,
        organization: String,
        team_id: String,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: normalize_email(email),
            password_hash,
            organization,
            team_id,
            role,
            total_drills: 0,
            drills_completed: 0,
            drill_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_team_admin(&self) -> bool {
        self.role == UserRole::TeamAdmin
    }

    pub fn record_drills_added(&mut self, count: u32) {
        self.total_drills = self.total_drills.saturating_add(count);
    }

    pub fn apply_completion(&mut self, delta: CompletionDelta) {
        match delta {
            CompletionDelta::Gained => self.drills_completed = self.drills_completed.saturating_add(1),
            CompletionDelta::Lost => self.drills_completed = self.drills_completed.saturating_sub(1),
            CompletionDelta::Unchanged => {}
        }
    }

    /// Counter bookkeeping for a deleted drill, clamped at zero
    pub fn record_drill_removed(&mut self, was_completed: bool) {
        self.total_drills = self.total_drills.saturating_sub(1);
        if was_completed {
            self.drills_completed = self.drills_completed.saturating_sub(1);
        }
    }
}

/// Emails are matched case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal user shape returned by register/login
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub organization: String,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            organization: user.organization.clone(),
        }
    }
}

/// Full profile including counters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub organization: String,
    pub team_id: String,
    pub role: UserRole,
    pub total_drills: u32,
    pub drills_completed: u32,
    pub drill_history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            organization: user.organization.clone(),
            team_id: user.team_id.clone(),
            role: user.role,
            total_drills: user.total_drills,
            drills_completed: user.drills_completed,
            drill_history: user.drill_history.clone(),
            created_at: user.created_at,
        }
    }
}

/// Populated user reference (`_id`, `name`, `email`)
#[derive(Debug, Clone, Serialize)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&UserRecord> for UserRef {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}
