//! Wishlist handlers

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
    db::{models::WishlistItem, NewWishlistItem},
    errors::{AppError, Result},
};

/// Paper snapshot to save
#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[validate(length(max = 500))]
    pub authors: Option<String>,

    #[validate(length(max = 10))]
    pub year: Option<String>,

    #[validate(length(max = 300))]
    pub publication: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub cited_by: i32,

    #[validate(length(max = 100))]
    pub doi: Option<String>,

    #[validate(length(max = 100))]
    pub eid: Option<String>,

    pub scopus_url: Option<String>,

    pub notes: Option<String>,
}

impl From<AddItemRequest> for NewWishlistItem {
    fn from(request: AddItemRequest) -> Self {
        Self {
            title: request.title,
            authors: request.authors,
            year: request.year,
            publication: request.publication,
            cited_by: request.cited_by,
            doi: request.doi,
            eid: request.eid,
            scopus_url: request.scopus_url,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WishlistResponse {
    pub id: Uuid,
    pub title: String,
    pub authors: Option<String>,
    pub year: Option<String>,
    pub publication: Option<String>,
    pub cited_by: i32,
    pub doi: Option<String>,
    pub eid: Option<String>,
    pub scopus_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<WishlistItem> for WishlistResponse {
    fn from(item: WishlistItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            authors: item.authors,
            year: item.year,
            publication: item.publication,
            cited_by: item.cited_by,
            doi: item.doi,
            eid: item.eid,
            scopus_url: item.scopus_url,
            notes: item.notes,
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub in_wishlist: bool,
    pub wishlist_id: Option<Uuid>,
}

pub async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<WishlistResponse>)> {
    request.validate()?;

    let item = state
        .repo()
        .create_wishlist_item(user.id, request.into())
        .await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// The user's wishlist, newest first
pub async fn list_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<WishlistResponse>>> {
    let items = state.repo().list_wishlist(user.id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn get_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WishlistResponse>> {
    let item = state
        .repo()
        .find_wishlist_item(user.id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Wishlist item", id))?;

    Ok(Json(item.into()))
}

pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.repo().delete_wishlist_item(user.id, id).await? {
        return Err(AppError::not_found("Wishlist item", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateNotesRequest>,
) -> Result<Json<WishlistResponse>> {
    let item = state
        .repo()
        .update_wishlist_notes(user.id, id, request.notes)
        .await?;

    Ok(Json(item.into()))
}

/// Whether a paper is already saved
pub async fn check_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(eid): Path<String>,
) -> Result<Json<CheckResponse>> {
    let item = state.repo().find_wishlist_item_by_eid(user.id, &eid).await?;

    Ok(Json(CheckResponse {
        in_wishlist: item.is_some(),
        wishlist_id: item.map(|i| i.id),
    }))
}
