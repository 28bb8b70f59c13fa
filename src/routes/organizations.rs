use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{ERR_INVALID_ORG_ID, ERR_ORG_NOT_FOUND};
use crate::db;
use crate::error::{AppError, Result};
use crate::models::{
    DrillRecord, DrillView, OrgStatus, OrganizationRecord, OrganizationView, Visibility,
};
use crate::policy::{authorize, Action, Actor, Resource};
use crate::routes::drills::{adjust_owner, persist_generated};
use crate::routes::extract::CurrentUser;
use crate::routes::validation::{date_range, non_empty, parse_id};
use crate::schedule;
use crate::stats::DrillStats;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRequest {
    pub company_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub planned_drills_per_year: Option<u32>,
    pub drill_types: Option<Vec<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDrillsRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub number_of_drills: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub message: &'static str,
    pub organization: OrganizationView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledResponse {
    pub message: &'static str,
    pub drills_generated: usize,
    /// Organization name
    pub organization: String,
    pub drills: Vec<DrillView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationStats {
    #[serde(flatten)]
    pub drills: DrillStats,
    pub user_count: u32,
}

#[derive(Debug, Serialize)]
pub struct OrganizationStatsResponse {
    pub organization: Value,
    pub stats: OrganizationStats,
}

/// Apply optional request fields onto an existing record
fn apply_changes(org: &mut OrganizationRecord, payload: OrganizationRequest) -> Result<()> {
    if let Some(status) = non_empty(payload.status.as_deref()) {
        org.status = status.parse::<OrgStatus>()?;
    }
    if let Some(name) = non_empty(payload.name.as_deref()) {
        org.name = name.to_string();
    }
    if let Some(description) = payload.description {
        org.description = description;
    }
    if let Some(industry) = payload.industry {
        org.industry = industry;
    }
    if let Some(location) = payload.location {
        org.location = location;
    }
    // Zero means unset
    if let Some(planned) = payload.planned_drills_per_year.filter(|n| *n > 0) {
        org.planned_drills_per_year = planned;
    }
    if let Some(types) = payload.drill_types {
        org.drill_types = types
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();
    }
    Ok(())
}

fn populated(db: &redb::Database, org: &OrganizationRecord) -> Result<OrganizationView> {
    let users = db::users::user_directory(db)?;
    Ok(OrganizationView::populate(org, &users))
}

fn load_organization(db: &redb::Database, id: &str) -> Result<OrganizationRecord> {
    db::organizations::get_organization(db, id)?
        .ok_or_else(|| AppError::not_found(ERR_ORG_NOT_FOUND))
}

pub async fn create_organization(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<OrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>)> {
    let (company_id, name) = match (
        non_empty(payload.company_id.as_deref()),
        non_empty(payload.name.as_deref()),
    ) {
        (Some(c), Some(n)) => (c.to_string(), n.to_string()),
        _ => return Err(AppError::invalid("Company ID and name are required")),
    };

    let mut org = OrganizationRecord::new(company_id, name, &user.id);
    apply_changes(&mut org, payload)?;

    let view = db::run(&state.db, move |db| {
        db::organizations::insert_organization(db, &org)?;
        populated(db, &org)
    })
    .await?;

    tracing::info!(organization = %view.id, company_id = %view.company_id, "Organization created");

    Ok((
        StatusCode::CREATED,
        Json(OrganizationResponse {
            message: "Organization created successfully",
            organization: view,
        }),
    ))
}

/// All organizations, newest first
pub async fn list_organizations(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
) -> Result<Json<Vec<OrganizationView>>> {
    let views = db::run(&state.db, |db| {
        let users = db::users::user_directory(db)?;
        let mut orgs = db::organizations::list_organizations(db)?;
        orgs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orgs
            .iter()
            .map(|org| OrganizationView::populate(org, &users))
            .collect())
    })
    .await?;

    Ok(Json(views))
}

pub async fn get_organization(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<OrganizationView>> {
    let id = parse_id(&id, ERR_INVALID_ORG_ID)?;
    let view = db::run(&state.db, move |db| {
        let org = load_organization(db, &id)?;
        populated(db, &org)
    })
    .await?;

    Ok(Json(view))
}

/// Update an organization; admins and the creator only
pub async fn update_organization(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<OrganizationRequest>,
) -> Result<Json<OrganizationResponse>> {
    let id = parse_id(&id, ERR_INVALID_ORG_ID)?;
    let lookup = id.clone();
    let org = db::run(&state.db, move |db| load_organization(db, &lookup)).await?;
    authorize(&Actor::from(&user), &Resource::Organization(&org), Action::Modify)?;

    // Validate before touching the store
    let mut preview = org.clone();
    apply_changes(&mut preview, payload)?;

    let view = db::run(&state.db, move |db| {
        let updated = db::organizations::update_organization(db, &id, |o| {
            o.name = preview.name;
            o.description = preview.description;
            o.industry = preview.industry;
            o.location = preview.location;
            o.planned_drills_per_year = preview.planned_drills_per_year;
            o.drill_types = preview.drill_types;
            o.status = preview.status;
        })?
        .ok_or_else(|| AppError::not_found(ERR_ORG_NOT_FOUND))?;
        populated(db, &updated)
    })
    .await?;

    tracing::info!(organization = %view.id, user = %user.id, "Organization updated");

    Ok(Json(OrganizationResponse {
        message: "Organization updated successfully",
        organization: view,
    }))
}

pub async fn delete_organization(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, ERR_INVALID_ORG_ID)?;
    let lookup = id.clone();
    let org = db::run(&state.db, move |db| load_organization(db, &lookup)).await?;
    authorize(&Actor::from(&user), &Resource::Organization(&org), Action::Delete)?;

    db::run(&state.db, move |db| db::organizations::remove_organization(db, &id))
        .await?
        .ok_or_else(|| AppError::not_found(ERR_ORG_NOT_FOUND))?;

    tracing::info!(organization = %org.id, user = %user.id, "Organization deleted");

    Ok(Json(json!({ "message": "Organization deleted successfully" })))
}

/// Bulk-schedule drills across the organization's catalog.
///
/// Drills are owned by the caller and visible organization-wide.
pub async fn schedule_drills(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ScheduleDrillsRequest>,
) -> Result<Json<ScheduledResponse>> {
    let (start, end) = date_range(payload.start_date.as_deref(), payload.end_date.as_deref())?;
    let id = parse_id(&id, ERR_INVALID_ORG_ID)?;
    let lookup = id.clone();
    let org = db::run(&state.db, move |db| load_organization(db, &lookup)).await?;
    authorize(&Actor::from(&user), &Resource::Organization(&org), Action::Schedule)?;

    let count = payload
        .number_of_drills
        .filter(|n| *n > 0)
        .unwrap_or(org.planned_drills_per_year as usize);

    tracing::info!(
        organization = %org.id,
        user = %user.id,
        %start,
        %end,
        count,
        "Scheduling organization drills"
    );

    let drills: Vec<DrillRecord> = schedule::generate(start, end, count, &org.scheduling_catalog())
        .into_iter()
        .map(|slot| {
            let mut drill = DrillRecord::new(&user.id, slot.drill_type, slot.date);
            drill.notes = format!("Scheduled {} for {}", drill.drill_name, org.name);
            drill.created_by = Some(user.id.clone());
            drill.team_id = user.team_id.clone();
            drill.visibility = Visibility::Organization;
            drill
        })
        .collect();

    let caller_id = user.id.clone();
    let (saved, org) = db::run(&state.db, move |db| {
        let saved = persist_generated(db, drills);
        let added = saved.len() as u32;

        let org = if added > 0 {
            let updated = db::organizations::update_organization(db, &id, |o| {
                o.total_drills = o.total_drills.saturating_add(added)
            })?;
            if updated.is_none() {
                tracing::warn!(organization = %id, "Organization vanished before counter update");
            }
            adjust_owner(db, &caller_id, |u| u.record_drills_added(added))?;
            updated.unwrap_or(org)
        } else {
            org
        };

        Ok((saved, org))
    })
    .await?;

    tracing::info!(
        organization = %org.id,
        total = org.total_drills,
        generated = saved.len(),
        "Organization drills scheduled"
    );

    Ok(Json(ScheduledResponse {
        message: "Drills scheduled successfully",
        drills_generated: saved.len(),
        organization: org.name,
        drills: saved.iter().map(DrillView::from).collect(),
    }))
}

/// Aggregate drill counts over members of the organization
pub async fn organization_stats(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<OrganizationStatsResponse>> {
    let id = parse_id(&id, ERR_INVALID_ORG_ID)?;
    let (org, member_count, stats) = db::run(&state.db, move |db| {
        let org = load_organization(db, &id)?;
        let members: HashSet<String> = db::users::list_users(db)?
            .into_iter()
            .filter(|u| u.organization == org.name)
            .map(|u| u.id)
            .collect();
        let drills = db::drills::list_drills(db)?;
        let stats: DrillStats = drills
            .iter()
            .filter(|d| members.contains(&d.user_id))
            .collect();
        Ok((org, members.len() as u32, stats))
    })
    .await?;

    Ok(Json(OrganizationStatsResponse {
        organization: json!({
            "_id": org.id,
            "companyId": org.company_id,
            "name": org.name,
            "plannedDrillsPerYear": org.planned_drills_per_year,
        }),
        stats: OrganizationStats {
            drills: stats,
            user_count: member_count,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OrganizationRequest {
        OrganizationRequest {
            company_id: None,
            name: None,
            description: None,
            industry: None,
            location: None,
            planned_drills_per_year: None,
            drill_types: None,
            status: None,
        }
    }

    #[test]
    fn test_apply_changes_keeps_unset_fields() {
        let mut org = OrganizationRecord::new("ACME-1".into(), "Acme".into(), "creator");
        apply_changes(
            &mut org,
            OrganizationRequest {
                planned_drills_per_year: Some(4),
                status: Some("suspended".into()),
                ..request()
            },
        )
        .unwrap();

        assert_eq!(org.name, "Acme");
        assert_eq!(org.planned_drills_per_year, 4);
        assert_eq!(org.status, OrgStatus::Suspended);
    }

    #[test]
    fn test_zero_planned_drills_is_ignored() {
        let mut org = OrganizationRecord::new("ACME-1".into(), "Acme".into(), "creator");
        apply_changes(
            &mut org,
            OrganizationRequest {
                planned_drills_per_year: Some(0),
                ..request()
            },
        )
        .unwrap();
        assert_eq!(org.planned_drills_per_year, 12);

        org.planned_drills_per_year = 6;
        apply_changes(
            &mut org,
            OrganizationRequest {
                planned_drills_per_year: Some(0),
                ..request()
            },
        )
        .unwrap();
        assert_eq!(org.planned_drills_per_year, 6);
    }

    #[test]
    fn test_apply_changes_rejects_unknown_status() {
        let mut org = OrganizationRecord::new("ACME-1".into(), "Acme".into(), "creator");
        let err = apply_changes(
            &mut org,
            OrganizationRequest {
                status: Some("closed".into()),
                ..request()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
