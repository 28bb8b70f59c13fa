use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use redb::Database;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_GENERATED_DRILLS, ERR_DRILL_NOT_FOUND, ERR_INVALID_DRILL_ID,
};
use crate::db;
use crate::error::{AppError, Result};
use crate::models::{
    organization::default_drill_types, DrillRecord, DrillStatus, DrillView, UserRecord,
    UserRole, Visibility,
};
use crate::policy::{authorize, permits, Action, Actor, Resource};
use crate::routes::extract::CurrentUser;
use crate::routes::validation::{date_range, non_empty, parse_id, require_date};
use crate::schedule;
use crate::stats::DrillStats;
use crate::AppState;

/// Which drills a listing or statistics request covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    My,
    Team,
    Organization,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::My => "my",
            Scope::Team => "team",
            Scope::Organization => "organization",
        }
    }

    /// Whether `drill` belongs in this scope for `actor`
    pub fn includes(&self, actor: &Actor<'_>, drill: &DrillRecord, owner_org: Option<&str>) -> bool {
        let visible = || {
            permits(
                actor,
                &Resource::Drill {
                    drill,
                    owner_organization: owner_org,
                },
                Action::View,
            )
        };

        match self {
            Scope::My => drill.user_id == actor.id,
            Scope::Team => {
                drill.team_id == actor.team_id
                    && owner_org == Some(actor.organization)
                    && visible()
            }
            Scope::Organization => owner_org == Some(actor.organization) && visible(),
        }
    }
}

impl FromStr for Scope {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "my" => Ok(Scope::My),
            "team" => Ok(Scope::Team),
            "organization" => Ok(Scope::Organization),
            other => Err(AppError::invalid(format!("Invalid scope: {other}"))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DrillQuery {
    pub scope: Option<String>,
    pub status: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDrillRequest {
    #[serde(alias = "drillName")]
    pub name: Option<String>,
    pub scheduled_date: Option<String>,
    #[serde(alias = "notes")]
    pub description: Option<String>,
    pub team_id: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDrillRequest {
    #[serde(alias = "drillName")]
    pub name: Option<String>,
    pub scheduled_date: Option<String>,
    #[serde(alias = "notes")]
    pub description: Option<String>,
    pub status: Option<String>,
    pub team_id: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub number_of_drills: Option<usize>,
    pub drill_types: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct DrillResponse {
    pub message: &'static str,
    pub drill: DrillView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDrillResponse {
    pub message: &'static str,
    pub total_drills: u32,
    pub completed_drills: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResponse {
    pub message: &'static str,
    pub drills_generated: usize,
    pub drills: Vec<DrillView>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub scope: &'static str,
    #[serde(flatten)]
    pub stats: DrillStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub team_id: String,
    pub role: UserRole,
    #[serde(flatten)]
    pub stats: DrillStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub team_id: String,
    pub member_count: u32,
    #[serde(flatten)]
    pub stats: DrillStats,
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Drills in `scope` for `caller`, sorted by scheduled date
pub(crate) fn select_scoped(
    db: &Database,
    caller: &UserRecord,
    scope: Scope,
) -> Result<Vec<DrillRecord>> {
    let directory = db::users::user_directory(db)?;
    let actor = Actor::from(caller);
    db::drills::select_drills(db, |drill| {
        let owner_org = directory
            .get(&drill.user_id)
            .map(|u| u.organization.as_str());
        scope.includes(&actor, drill, owner_org)
    })
}

/// Save generated drills one write at a time.
///
/// A failed write is logged and skipped; the rest of the batch continues.
pub(crate) fn persist_generated(db: &Database, drills: Vec<DrillRecord>) -> Vec<DrillRecord> {
    let mut saved = Vec::with_capacity(drills.len());
    for drill in drills {
        match db::drills::save_drill(db, &drill) {
            Ok(()) => saved.push(drill),
            Err(e) => tracing::warn!(
                "Skipping generated drill {} on {}: {}",
                drill.drill_name,
                drill.scheduled_date,
                e
            ),
        }
    }
    saved
}

/// Counter side effect on the drill owner, written after the drill itself.
///
/// A missing owner is logged and tolerated; the counters simply drift.
pub(crate) fn adjust_owner<F>(db: &Database, owner_id: &str, apply: F) -> Result<Option<UserRecord>>
where
    F: FnOnce(&mut UserRecord),
{
    let updated = db::users::update_user(db, owner_id, apply)?;
    if updated.is_none() {
        tracing::warn!(owner = owner_id, "Drill owner not found, counters not adjusted");
    }
    Ok(updated)
}

/// Load a drill together with its owner's organization
fn load_drill(db: &Database, id: &str) -> Result<(DrillRecord, Option<String>)> {
    let drill = db::drills::get_drill(db, id)?
        .ok_or_else(|| AppError::not_found(ERR_DRILL_NOT_FOUND))?;
    let owner_org = db::users::get_user(db, &drill.user_id)?.map(|u| u.organization);
    Ok((drill, owner_org))
}

fn parse_opt<T: FromStr<Err = AppError>>(raw: Option<&str>) -> Result<Option<T>> {
    non_empty(raw).map(str::parse::<T>).transpose()
}

// =============================================================================
// Handlers
// =============================================================================

/// List drills visible in the requested scope, optionally filtered
pub async fn list_drills(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DrillQuery>,
) -> Result<Json<Vec<DrillView>>> {
    let scope: Scope = parse_opt(query.scope.as_deref())?.unwrap_or_default();
    let status: Option<DrillStatus> = parse_opt(query.status.as_deref())?;
    let visibility: Option<Visibility> = parse_opt(query.visibility.as_deref())?;

    let drills = db::run(&state.db, move |db| select_scoped(db, &user, scope)).await?;

    let views: Vec<DrillView> = drills
        .iter()
        .filter(|d| status.map_or(true, |s| d.status == s))
        .filter(|d| visibility.map_or(true, |v| d.visibility == v))
        .map(DrillView::from)
        .collect();

    tracing::debug!(scope = scope.as_str(), count = views.len(), "Listed drills");
    Ok(Json(views))
}

/// Create a single drill owned by the caller
pub async fn create_drill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateDrillRequest>,
) -> Result<(StatusCode, Json<DrillResponse>)> {
    let (name, date) = match (
        non_empty(payload.name.as_deref()),
        non_empty(payload.scheduled_date.as_deref()),
    ) {
        (Some(name), Some(date)) => (name.to_string(), require_date(date)?),
        _ => return Err(AppError::invalid("Name and scheduled date are required")),
    };
    let visibility: Option<Visibility> = parse_opt(payload.visibility.as_deref())?;

    let mut drill = DrillRecord::new(&user.id, name, date);
    drill.created_by = Some(user.id.clone());
    drill.notes = payload.description.unwrap_or_default();
    drill.team_id = non_empty(payload.team_id.as_deref())
        .unwrap_or(&user.team_id)
        .to_string();
    drill.visibility = visibility.unwrap_or_default();

    let saved = drill.clone();
    db::run(&state.db, move |db| {
        db::drills::save_drill(db, &saved)?;
        adjust_owner(db, &saved.user_id, |u| u.record_drills_added(1))?;
        Ok(())
    })
    .await?;

    tracing::info!(drill = %drill.id, user = %user.id, "Drill created");

    Ok((
        StatusCode::CREATED,
        Json(DrillResponse {
            message: "Drill added successfully",
            drill: DrillView::from(&drill),
        }),
    ))
}

/// Fetch one drill the caller is allowed to see
pub async fn get_drill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DrillView>> {
    let id = parse_id(&id, ERR_INVALID_DRILL_ID)?;
    let (drill, owner_org) = db::run(&state.db, move |db| load_drill(db, &id)).await?;

    authorize(
        &Actor::from(&user),
        &Resource::Drill {
            drill: &drill,
            owner_organization: owner_org.as_deref(),
        },
        Action::View,
    )?;

    Ok(Json(DrillView::from(&drill)))
}

/// Update fields and status of a drill.
///
/// A status change adjusts the owner's completed counter in a second write.
pub async fn update_drill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDrillRequest>,
) -> Result<Json<DrillResponse>> {
    let id = parse_id(&id, ERR_INVALID_DRILL_ID)?;
    let status: Option<DrillStatus> = parse_opt(payload.status.as_deref())?;
    let visibility: Option<Visibility> = parse_opt(payload.visibility.as_deref())?;
    let scheduled_date = non_empty(payload.scheduled_date.as_deref())
        .map(require_date)
        .transpose()?;

    let (mut drill, owner_org) = db::run(&state.db, move |db| load_drill(db, &id)).await?;
    authorize(
        &Actor::from(&user),
        &Resource::Drill {
            drill: &drill,
            owner_organization: owner_org.as_deref(),
        },
        Action::Modify,
    )?;

    if let Some(name) = non_empty(payload.name.as_deref()) {
        drill.drill_name = name.to_string();
    }
    if let Some(date) = scheduled_date {
        drill.scheduled_date = date;
    }
    if let Some(notes) = payload.description {
        drill.notes = notes;
    }
    if let Some(team_id) = non_empty(payload.team_id.as_deref()) {
        drill.team_id = team_id.to_string();
    }
    if let Some(visibility) = visibility {
        drill.visibility = visibility;
    }

    let now = Utc::now();
    let delta = status.map(|s| drill.set_status(s, now));
    drill.updated_at = now;

    let saved = drill.clone();
    db::run(&state.db, move |db| {
        db::drills::save_drill(db, &saved)?;
        if let Some(delta) = delta {
            adjust_owner(db, &saved.user_id, |u| u.apply_completion(delta))?;
        }
        Ok(())
    })
    .await?;

    tracing::info!(drill = %drill.id, status = %drill.status, "Drill updated");

    Ok(Json(DrillResponse {
        message: "Drill updated successfully",
        drill: DrillView::from(&drill),
    }))
}

/// Delete a drill and decrement the owner's counters
pub async fn delete_drill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteDrillResponse>> {
    let id = parse_id(&id, ERR_INVALID_DRILL_ID)?;
    let (drill, owner_org) = db::run(&state.db, move |db| load_drill(db, &id)).await?;
    authorize(
        &Actor::from(&user),
        &Resource::Drill {
            drill: &drill,
            owner_organization: owner_org.as_deref(),
        },
        Action::Delete,
    )?;

    let drill_id = drill.id.clone();
    let owner_id = drill.user_id.clone();
    let owner = db::run(&state.db, move |db| {
        let removed = db::drills::remove_drill(db, &drill_id)?
            .ok_or_else(|| AppError::not_found(ERR_DRILL_NOT_FOUND))?;
        adjust_owner(db, &owner_id, |u| u.record_drill_removed(removed.is_completed()))
    })
    .await?;

    tracing::info!(drill = %drill.id, "Drill deleted");

    Ok(Json(DeleteDrillResponse {
        message: "Drill deleted successfully",
        total_drills: owner.as_ref().map_or(0, |u| u.total_drills),
        completed_drills: owner.as_ref().map_or(0, |u| u.drills_completed),
    }))
}

/// Bulk-create evenly spaced drills for the caller
pub async fn generate_schedule(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<GenerateScheduleRequest>,
) -> Result<Json<GeneratedResponse>> {
    let (start, end) = date_range(payload.start_date.as_deref(), payload.end_date.as_deref())?;
    let count = payload
        .number_of_drills
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_GENERATED_DRILLS);
    let catalog: Vec<String> = payload
        .drill_types
        .unwrap_or_default()
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect();
    let catalog = if catalog.is_empty() {
        default_drill_types()
    } else {
        catalog
    };

    tracing::info!(user = %user.id, %start, %end, count, "Generating schedule");

    let drills: Vec<DrillRecord> = schedule::generate(start, end, count, &catalog)
        .into_iter()
        .map(|slot| {
            let mut drill = DrillRecord::new(&user.id, slot.drill_type, slot.date);
            drill.notes = format!("Scheduled {} for the period", drill.drill_name);
            drill.created_by = Some(user.id.clone());
            drill.team_id = user.team_id.clone();
            drill
        })
        .collect();

    let owner_id = user.id.clone();
    let saved = db::run(&state.db, move |db| {
        let saved = persist_generated(db, drills);
        if !saved.is_empty() {
            let added = saved.len() as u32;
            adjust_owner(db, &owner_id, |u| u.record_drills_added(added))?;
        }
        Ok(saved)
    })
    .await?;

    tracing::info!(user = %user.id, generated = saved.len(), "Schedule generated");

    Ok(Json(GeneratedResponse {
        message: "Schedule generated successfully",
        drills_generated: saved.len(),
        drills: saved.iter().map(DrillView::from).collect(),
    }))
}

/// Aggregate counts for the requested scope
pub async fn drill_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DrillQuery>,
) -> Result<Json<StatsResponse>> {
    let scope: Scope = parse_opt(query.scope.as_deref())?.unwrap_or_default();
    let drills = db::run(&state.db, move |db| select_scoped(db, &user, scope)).await?;

    Ok(Json(StatsResponse {
        scope: scope.as_str(),
        stats: drills.iter().collect(),
    }))
}

/// Members of the caller's team with their drill counts
pub async fn team_members(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TeamMember>>> {
    let (members, drills) = db::run(&state.db, move |db| {
        let members: Vec<UserRecord> = db::users::list_users(db)?
            .into_iter()
            .filter(|u| u.organization == user.organization && u.team_id == user.team_id)
            .collect();
        Ok((members, db::drills::list_drills(db)?))
    })
    .await?;

    let mut roster: Vec<TeamMember> = members
        .iter()
        .map(|member| TeamMember {
            id: member.id.clone(),
            name: member.name.clone(),
            email: member.email.clone(),
            team_id: member.team_id.clone(),
            role: member.role,
            stats: drills.iter().filter(|d| d.user_id == member.id).collect(),
        })
        .collect();
    roster.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(roster))
}

/// Teams of the caller's organization with roll-up counts
pub async fn list_teams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TeamSummary>>> {
    let organization = user.organization.clone();
    let (members, drills) = db::run(&state.db, move |db| {
        let members: Vec<UserRecord> = db::users::list_users(db)?
            .into_iter()
            .filter(|u| u.organization == organization)
            .collect();
        Ok((members, db::drills::list_drills(db)?))
    })
    .await?;

    let mut teams: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for member in &members {
        teams.entry(&member.team_id).or_default().push(&member.id);
    }

    let summaries = teams
        .into_iter()
        .map(|(team_id, member_ids)| TeamSummary {
            team_id: team_id.to_string(),
            member_count: member_ids.len() as u32,
            stats: drills
                .iter()
                .filter(|d| member_ids.contains(&d.user_id.as_str()))
                .collect(),
        })
        .collect();

    Ok(Json(summaries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, org: &str, team: &str) -> UserRecord {
        let mut u = UserRecord::new(
            id.into(),
            &format!("{id}@example.com"),
            "hash".into(),
            org.into(),
            team.into(),
            UserRole::Member,
        );
        u.id = id.into();
        u
    }

    fn drill(owner: &str, team: &str, visibility: Visibility) -> DrillRecord {
        let mut d = DrillRecord::new(owner, "Drill".into(), Utc::now());
        d.team_id = team.into();
        d.visibility = visibility;
        d
    }

    #[test]
    fn test_scope_my_is_ownership_only() {
        let me = user("me", "Acme", "red");
        let actor = Actor::from(&me);
        assert!(Scope::My.includes(&actor, &drill("me", "blue", Visibility::Private), Some("Acme")));
        assert!(!Scope::My.includes(&actor, &drill("you", "red", Visibility::Team), Some("Acme")));
    }

    #[test]
    fn test_scope_team_requires_same_team_and_org() {
        let me = user("me", "Acme", "red");
        let actor = Actor::from(&me);
        let teammate = drill("mate", "red", Visibility::Team);

        assert!(Scope::Team.includes(&actor, &teammate, Some("Acme")));
        assert!(!Scope::Team.includes(&actor, &teammate, Some("Globex")));
        assert!(!Scope::Team.includes(&actor, &drill("mate", "red", Visibility::Private), Some("Acme")));
        assert!(!Scope::Team.includes(&actor, &drill("x", "blue", Visibility::Team), Some("Acme")));
    }

    #[test]
    fn test_scope_organization_respects_visibility() {
        let me = user("me", "Acme", "red");
        let actor = Actor::from(&me);

        assert!(Scope::Organization.includes(&actor, &drill("x", "blue", Visibility::Organization), Some("Acme")));
        assert!(!Scope::Organization.includes(&actor, &drill("x", "blue", Visibility::Team), Some("Acme")));
        assert!(Scope::Organization.includes(&actor, &drill("x", "red", Visibility::Team), Some("Acme")));
        assert!(!Scope::Organization.includes(&actor, &drill("x", "blue", Visibility::Organization), None));
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("team".parse::<Scope>().unwrap(), Scope::Team);
        assert!("everyone".parse::<Scope>().is_err());
        assert_eq!(parse_opt::<Scope>(Some("  ")).unwrap(), None);
    }
}
