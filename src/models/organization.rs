use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_ORG_DRILL_TYPES, DEFAULT_PLANNED_DRILLS_PER_YEAR};
use crate::error::AppError;
use crate::models::user::{UserRecord, UserRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl FromStr for OrgStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(OrgStatus::Active),
            "inactive" => Ok(OrgStatus::Inactive),
            "suspended" => Ok(OrgStatus::Suspended),
            other => Err(AppError::invalid(format!("Invalid organization status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntry {
    pub team_id: String,
    pub name: String,
    pub member_count: u32,
}

/// Organization document stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub id: String,
    /// Unique external identifier
    pub company_id: String,
    pub name: String,
    pub description: String,
    pub industry: String,
    pub location: String,
    /// Incremented every time drills are scheduled through the organization
    pub total_drills: u32,
    pub planned_drills_per_year: u32,
    pub created_by: String,
    pub admins: Vec<String>,
    pub teams: Vec<TeamEntry>,
    pub drill_types: Vec<String>,
    pub status: OrgStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationRecord {
    /// New organization whose creator is also its first admin
    pub fn new(company_id: String, name: String, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            company_id,
            name,
            description: String::new(),
            industry: String::new(),
            location: String::new(),
            total_drills: 0,
            planned_drills_per_year: DEFAULT_PLANNED_DRILLS_PER_YEAR,
            created_by: created_by.to_string(),
            admins: vec![created_by.to_string()],
            teams: Vec::new(),
            drill_types: default_drill_types(),
            status: OrgStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Catalog used for scheduling, falling back to the defaults when emptied
    pub fn scheduling_catalog(&self) -> Vec<String> {
        if self.drill_types.is_empty() {
            default_drill_types()
        } else {
            self.drill_types.clone()
        }
    }
}

pub fn default_drill_types() -> Vec<String> {
    DEFAULT_ORG_DRILL_TYPES.iter().map(|s| s.to_string()).collect()
}

/// Organization as returned to clients, with user references populated
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationView {
    #[serde(rename = "_id")]
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub description: String,
    pub industry: String,
    pub location: String,
    pub total_drills: u32,
    pub planned_drills_per_year: u32,
    pub drill_types: Vec<String>,
    pub status: OrgStatus,
    pub created_by: Option<UserRef>,
    pub admins: Vec<UserRef>,
    pub teams: Vec<TeamEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationView {
    /// Build the view, resolving user ids against `users`; unknown ids are dropped
    pub fn populate(org: &OrganizationRecord, users: &HashMap<String, UserRecord>) -> Self {
        Self {
            id: org.id.clone(),
            company_id: org.company_id.clone(),
            name: org.name.clone(),
            description: org.description.clone(),
            industry: org.industry.clone(),
            location: org.location.clone(),
            total_drills: org.total_drills,
            planned_drills_per_year: org.planned_drills_per_year,
            drill_types: org.drill_types.clone(),
            status: org.status,
            created_by: users.get(&org.created_by).map(UserRef::from),
            admins: org
                .admins
                .iter()
                .filter_map(|id| users.get(id))
                .map(UserRef::from)
                .collect(),
            teams: org.teams.clone(),
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    #[test]
    fn test_new_organization_defaults() {
        let org = OrganizationRecord::new("ACME-1".into(), "Acme".into(), "creator");
        assert_eq!(org.admins, vec!["creator".to_string()]);
        assert_eq!(org.planned_drills_per_year, 12);
        assert_eq!(org.drill_types.len(), 5);
        assert_eq!(org.total_drills, 0);
        assert_eq!(org.status, OrgStatus::Active);
    }

    #[test]
    fn test_empty_catalog_falls_back_to_defaults() {
        let mut org = OrganizationRecord::new("ACME-1".into(), "Acme".into(), "creator");
        org.drill_types.clear();
        assert_eq!(org.scheduling_catalog(), default_drill_types());
    }

    #[test]
    fn test_view_populates_known_users_only() {
        let user = UserRecord::new(
            "Kim".into(),
            "kim@example.com",
            "hash".into(),
            "Acme".into(),
            "default-team".into(),
            UserRole::Member,
        );
        let mut org = OrganizationRecord::new("ACME-1".into(), "Acme".into(), &user.id);
        org.admins.push("someone-deleted".into());

        let users = HashMap::from([(user.id.clone(), user.clone())]);
        let view = OrganizationView::populate(&org, &users);

        assert_eq!(view.created_by.as_ref().map(|u| u.email.as_str()), Some("kim@example.com"));
        assert_eq!(view.admins.len(), 1);
    }
}
