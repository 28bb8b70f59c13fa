use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db;
use crate::error::AppError;
use crate::models::UserRecord;
use crate::security::{extract_token_from_header, verify_token};
use crate::AppState;

/// The caller identified by the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let token = extract_token_from_header(header)
            .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()))?;

        let claims = verify_token(token, &state.config.jwt_secret)?;
        let user_id = claims.user_id;

        let user = db::run(&state.db, move |db| db::users::get_user(db, &user_id))
            .await?
            .ok_or_else(|| {
                tracing::warn!("Token refers to a user that no longer exists");
                AppError::Unauthorized("Token is not valid".to_string())
            })?;

        Ok(CurrentUser(user))
    }
}
