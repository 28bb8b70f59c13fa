use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::constants::ERR_USER_NOT_FOUND;
use crate::db;
use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::routes::extract::CurrentUser;
use crate::routes::validation::non_empty;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub team_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub count: usize,
    pub users: Vec<UserProfile>,
}

pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// Update name, organization or team of the caller
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let name = non_empty(payload.name.as_deref()).map(str::to_string);
    let organization = non_empty(payload.organization.as_deref()).map(str::to_string);
    let team_id = non_empty(payload.team_id.as_deref()).map(str::to_string);

    let user_id = user.id.clone();
    let updated = db::run(&state.db, move |db| {
        db::users::update_user(db, &user_id, |u| {
            if let Some(name) = name {
                u.name = name;
            }
            if let Some(organization) = organization {
                u.organization = organization;
            }
            if let Some(team_id) = team_id {
                u.team_id = team_id;
            }
        })
    })
    .await?
    .ok_or_else(|| AppError::not_found(ERR_USER_NOT_FOUND))?;

    tracing::info!(user = %updated.id, "Profile updated");

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully",
        user: UserProfile::from(&updated),
    }))
}

/// All users, newest first
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
) -> Result<Json<UserListResponse>> {
    let mut users = db::run(&state.db, db::users::list_users).await?;
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let users: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();
    Ok(Json(UserListResponse {
        count: users.len(),
        users,
    }))
}
