use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_TEAM_ID, DEFAULT_USER_DRILLS, ERR_INVALID_CREDENTIALS, MIN_PASSWORD_LEN,
    REGISTRATION_DRILL_SPACING_DAYS,
};
use crate::db;
use crate::error::{AppError, Result};
use crate::models::{DrillRecord, UserProfile, UserRecord, UserRole, UserSummary};
use crate::routes::drills::persist_generated;
use crate::routes::extract::CurrentUser;
use crate::routes::validation::non_empty;
use crate::schedule;
use crate::security::{hash_password, issue_token, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub organization: Option<String>,
    pub team_id: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

/// Register a new user
///
/// Seeds the default drill catalog for the new account: one drill of each
/// default type, 30 days apart starting now.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (name, email, password, organization) = match (
        non_empty(payload.name.as_deref()),
        non_empty(payload.email.as_deref()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
        non_empty(payload.organization.as_deref()),
    ) {
        (Some(n), Some(e), Some(p), Some(o)) => (n.to_string(), e.to_string(), p.to_string(), o.to_string()),
        _ => {
            return Err(AppError::invalid(
                "Name, email, password and organization are required",
            ))
        }
    };

    if !email.contains('@') {
        return Err(AppError::invalid("Invalid email format"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role = match non_empty(payload.role.as_deref()) {
        Some(raw) => raw.parse::<UserRole>()?,
        None => UserRole::Member,
    };
    let team_id = non_empty(payload.team_id.as_deref())
        .unwrap_or(DEFAULT_TEAM_ID)
        .to_string();

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
    let user = UserRecord::new(name, &email, password_hash, organization, team_id, role);

    let record = user.clone();
    let user = db::run(&state.db, move |db| {
        db::users::insert_user(db, &record)?;

        let seeded = persist_generated(db, default_catalog_for(&record));
        let count = seeded.len() as u32;
        let updated = db::users::update_user(db, &record.id, |u| u.record_drills_added(count))?;
        Ok(updated.unwrap_or(record))
    })
    .await?;

    tracing::info!(
        user = %user.id,
        seeded = user.total_drills,
        "New user registered"
    );

    let token = issue_token(&user.id, &state.config.jwt_secret, state.config.token_expiry_secs)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

/// Default drills for a new account
fn default_catalog_for(user: &UserRecord) -> Vec<DrillRecord> {
    let catalog: Vec<String> = DEFAULT_USER_DRILLS.iter().map(|s| s.to_string()).collect();
    let start = Utc::now();
    let end = start + Duration::days(REGISTRATION_DRILL_SPACING_DAYS * catalog.len() as i64);

    schedule::generate(start, end, catalog.len(), &catalog)
        .into_iter()
        .map(|slot| {
            let mut drill = DrillRecord::new(&user.id, slot.drill_type, slot.date);
            drill.created_by = Some(user.id.clone());
            drill.team_id = user.team_id.clone();
            drill
        })
        .collect()
}

/// Exchange email and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (email, password) = match (
        non_empty(payload.email.as_deref()),
        payload.password.filter(|p| !p.is_empty()),
    ) {
        (Some(e), Some(p)) => (e.to_string(), p),
        _ => return Err(AppError::invalid("Email and password are required")),
    };

    let user = db::run(&state.db, move |db| db::users::find_user_by_email(db, &email))
        .await?
        .ok_or_else(|| {
            tracing::info!("Login attempt for unknown email");
            AppError::invalid(ERR_INVALID_CREDENTIALS)
        })?;

    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await??;
    if !matches {
        tracing::info!(user = %user.id, "Login attempt with wrong password");
        return Err(AppError::invalid(ERR_INVALID_CREDENTIALS));
    }

    let token = issue_token(&user.id, &state.config.jwt_secret, state.config.token_expiry_secs)?;
    tracing::info!(user = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user: UserSummary::from(&user),
    }))
}

/// Current user profile with counters
pub async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: UserProfile::from(&user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_thirty_days_apart() {
        let user = UserRecord::new(
            "New".into(),
            "new@example.com",
            "hash".into(),
            "Acme".into(),
            "green".into(),
            UserRole::Member,
        );
        let drills = default_catalog_for(&user);

        assert_eq!(drills.len(), DEFAULT_USER_DRILLS.len());
        for (i, pair) in drills.windows(2).enumerate() {
            assert_eq!((pair[1].scheduled_date - pair[0].scheduled_date).num_days(), 30, "gap {i}");
        }
        assert_eq!(drills[0].drill_name, "Fire Evacuation Drill");
        assert_eq!(drills[11].drill_name, "Equipment Check Drill");
        assert!(drills.iter().all(|d| d.team_id == "green" && d.user_id == user.id));
    }
}
