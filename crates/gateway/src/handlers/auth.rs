//! Account handlers: registration, login and the current user

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::CurrentUser;
use crate::AppState;
use paperscope_common::{
    auth::{hash_password, verify_password},
    db::models::User,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserResponse,
}

/// Create an account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    request.validate()?;

    let password = request.password;
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Password hashing task failed: {}", e),
        })??;

    let user = state.repo().create_user(&request.email, hashed).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let rejected = || AppError::Unauthorized {
        message: "Incorrect email or password".to_string(),
    };

    let user = state
        .repo()
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(rejected)?;

    let stored_hash = user.hashed_password.clone();
    let password = request.password;
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Password verification task failed: {}", e),
        })?;

    if !verified {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(rejected());
    }

    if !user.is_active {
        return Err(AppError::Forbidden {
            message: "Inactive user".to_string(),
        });
    }

    let access_token = state.jwt.generate_token(user.id)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        user: user.into(),
    }))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

/// Delete the account together with its keys and wishlist
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode> {
    if !state.repo().delete_user(user.id).await? {
        return Err(AppError::not_found("User", user.id));
    }

    tracing::info!(user_id = %user.id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}
