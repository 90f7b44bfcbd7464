//! Bearer token authentication

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use paperscope_common::{
    auth::extract_bearer_token,
    db::models::User,
    errors::{AppError, Result},
};

use crate::AppState;

/// The authenticated, active user behind a request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer_token(header).ok_or_else(|| AppError::Unauthorized {
            message: "Expected a Bearer token".to_string(),
        })?;

        let claims = state.jwt.validate_token(token)?;
        let user = state
            .repo()
            .find_user_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::Unauthorized {
                message: "User not found".to_string(),
            })?;

        if !user.is_active {
            return Err(AppError::Forbidden {
                message: "Inactive user".to_string(),
            });
        }

        Ok(CurrentUser(user))
    }
}
