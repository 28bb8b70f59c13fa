pub mod auth;
pub mod drills;
pub mod extract;
pub mod health;
pub mod organizations;
pub mod users;
pub mod validation;

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::error::InternalErrorDetail;
use crate::AppState;

pub use health::health_check;

/// All API routes bound to `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/users", get(users::list_users))
        .route(
            "/api/drills",
            get(drills::list_drills).post(drills::create_drill),
        )
        .route("/api/drills/stats", get(drills::drill_stats))
        .route("/api/drills/generate-schedule", post(drills::generate_schedule))
        .route("/api/drills/team/members", get(drills::team_members))
        .route("/api/drills/teams", get(drills::list_teams))
        .route(
            "/api/drills/:id",
            get(drills::get_drill)
                .put(drills::update_drill)
                .delete(drills::delete_drill),
        )
        .route(
            "/api/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route(
            "/api/organizations/:id",
            get(organizations::get_organization)
                .put(organizations::update_organization)
                .delete(organizations::delete_organization),
        )
        .route(
            "/api/organizations/:id/schedule-drills",
            post(organizations::schedule_drills),
        )
        .route(
            "/api/organizations/:id/stats",
            get(organizations::organization_stats),
        )
        .fallback(not_found)
        .layer(middleware::map_response_with_state(
            state.clone(),
            expose_internal_detail,
        ))
        .with_state(state)
}

async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    tracing::debug!(%method, path = %uri.path(), "No route matched");
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "API endpoint not found",
            "message": format!("Cannot {} {}", method, uri.path()),
            "path": uri.path(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Add the raw error message to 500 bodies when running in development
async fn expose_internal_detail(State(state): State<AppState>, mut response: Response) -> Response {
    let Some(InternalErrorDetail(detail)) = response.extensions_mut().remove::<InternalErrorDetail>()
    else {
        return response;
    };
    if !state.config.is_development() {
        return response;
    }

    (
        response.status(),
        Json(json!({ "message": "Server error", "error": detail })),
    )
        .into_response()
}
