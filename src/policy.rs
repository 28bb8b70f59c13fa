//! Capability checks for drills and organizations.
//!
//! Every handler asks one question: may `actor` perform `action` on
//! `resource`? The rules are plain attribute comparisons.

use crate::error::{AppError, Result};
use crate::models::{DrillRecord, OrganizationRecord, UserRecord, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Modify,
    Delete,
    /// Bulk-create drills under an organization
    Schedule,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Modify => "update",
            Action::Delete => "delete",
            Action::Schedule => "schedule drills for",
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub id: &'a str,
    pub organization: &'a str,
    pub team_id: &'a str,
    pub team_admin: bool,
}

impl<'a> From<&'a UserRecord> for Actor<'a> {
    fn from(user: &'a UserRecord) -> Self {
        Self {
            id: &user.id,
            organization: &user.organization,
            team_id: &user.team_id,
            team_admin: user.is_team_admin(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Drill {
        drill: &'a DrillRecord,
        /// Organization name of the drill's owner, when known
        owner_organization: Option<&'a str>,
    },
    Organization(&'a OrganizationRecord),
}

impl Resource<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Resource::Drill { .. } => "drill",
            Resource::Organization(_) => "organization",
        }
    }
}

pub fn permits(actor: &Actor<'_>, resource: &Resource<'_>, action: Action) -> bool {
    match resource {
        Resource::Drill {
            drill,
            owner_organization,
        } => {
            let owner = drill.user_id == actor.id;
            // Teams are scoped to an organization
            let same_org = *owner_organization == Some(actor.organization);
            let same_team = same_org && drill.team_id == actor.team_id;
            let team_admin = actor.team_admin && same_team;
            match action {
                Action::View => {
                    owner
                        || team_admin
                        || match drill.visibility {
                            Visibility::Private => false,
                            Visibility::Team => same_team,
                            Visibility::Organization => same_org,
                        }
                }
                Action::Modify | Action::Delete => owner || team_admin,
                Action::Schedule => false,
            }
        }
        Resource::Organization(org) => match action {
            Action::View => true,
            Action::Modify | Action::Delete | Action::Schedule => {
                org.created_by == actor.id || org.admins.iter().any(|a| a == actor.id)
            }
        },
    }
}

/// `Ok(())` when permitted, otherwise a 403
pub fn authorize(actor: &Actor<'_>, resource: &Resource<'_>, action: Action) -> Result<()> {
    if permits(actor, resource, action) {
        return Ok(());
    }

    tracing::warn!(
        actor = actor.id,
        action = ?action,
        resource = resource.kind(),
        "Authorization denied"
    );
    Err(AppError::forbidden(format!(
        "Not authorized to {} this {}",
        action.verb(),
        resource.kind()
    )))
}
