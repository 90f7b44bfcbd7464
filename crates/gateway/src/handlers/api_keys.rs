//! Scopus API key management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::CurrentUser;
use crate::AppState;
use paperscope_common::{
    crypto::key_hint,
    db::models::ApiKey,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateKeyRequest {
    #[validate(length(min = 1, max = 100))]
    pub key_name: String,

    #[validate(length(min = 20))]
    pub api_key: String,
}

/// A stored key. The secret itself is never included.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    pub id: Uuid,
    pub key_name: String,
    pub key_hint: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            key_name: key.key_name,
            key_hint: key.key_hint,
            is_active: key.is_active,
            created_at: key.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActiveKeyResponse {
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Encrypt and store a new key
pub async fn create_key(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyResponse>)> {
    request.validate()?;

    let encrypted = state.cipher.encrypt(&request.api_key)?;
    let key = state
        .repo()
        .create_api_key(user.id, request.key_name, encrypted, key_hint(&request.api_key))
        .await?;

    tracing::info!(user_id = %user.id, key_id = %key.id, "API key stored");

    Ok((StatusCode::CREATED, Json(key.into())))
}

pub async fn list_keys(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ApiKeyResponse>>> {
    let keys = state.repo().list_api_keys(user.id).await?;
    Ok(Json(keys.into_iter().map(Into::into).collect()))
}

/// Reveal the plaintext of the key searches would use
pub async fn active_key(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ActiveKeyResponse>> {
    let Some(key) = state.repo().find_active_api_key(user.id).await? else {
        return Ok(Json(ActiveKeyResponse {
            api_key: None,
            key_name: None,
            key_id: None,
            message: Some("No active API key found. Please add one.".to_string()),
        }));
    };

    let api_key = state.cipher.decrypt(&key.encrypted_key)?;

    Ok(Json(ActiveKeyResponse {
        api_key: Some(api_key),
        key_name: Some(key.key_name),
        key_id: Some(key.id),
        message: None,
    }))
}

pub async fn delete_key(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.repo().delete_api_key(user.id, id).await? {
        return Err(AppError::not_found("API key", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a key between active and inactive
pub async fn toggle_key(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiKeyResponse>> {
    let key = state.repo().toggle_api_key(user.id, id).await?;
    Ok(Json(key.into()))
}
