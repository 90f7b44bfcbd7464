//! Author and affiliation lookups

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::CurrentUser;
use crate::AppState;
use paperscope_common::{
    errors::Result,
    scopus::{PaperRecord, DEFAULT_LOOKUP_LIMIT},
};

fn default_lookup_limit() -> u32 { DEFAULT_LOOKUP_LIMIT }

#[derive(Debug, Deserialize, Validate)]
pub struct LookupParams {
    #[serde(default = "default_lookup_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub author: String,
    pub total_papers: usize,
    pub papers: Vec<PaperRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AffiliationResponse {
    pub institution: String,
    pub total_papers: usize,
    pub papers: Vec<PaperRecord>,
}

pub async fn by_author(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    Query(params): Query<LookupParams>,
) -> Result<Json<AuthorResponse>> {
    params.validate()?;

    let papers = state
        .search_service_for(user.id)
        .await?
        .search_by_author(&name, params.limit)
        .await?;

    Ok(Json(AuthorResponse {
        author: name,
        total_papers: papers.len(),
        papers,
    }))
}

pub async fn by_affiliation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(institution): Path<String>,
    Query(params): Query<LookupParams>,
) -> Result<Json<AffiliationResponse>> {
    params.validate()?;

    let papers = state
        .search_service_for(user.id)
        .await?
        .search_by_affiliation(&institution, params.limit)
        .await?;

    Ok(Json(AffiliationResponse {
        institution,
        total_papers: papers.len(),
        papers,
    }))
}
