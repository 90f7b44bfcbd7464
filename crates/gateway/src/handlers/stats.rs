//! Citation statistics over a search result set

use axum::{extract::State, Json};

use super::search::SearchRequest;
use crate::middleware::CurrentUser;
use crate::AppState;
use paperscope_common::{
    errors::{AppError, Result},
    scopus::PaperStats,
};

pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SearchRequest>,
) -> Result<Json<PaperStats>> {
    let filters = request.into_filters()?;

    let outcome = state
        .search_service_for(user.id)
        .await?
        .search_papers(&filters, true)
        .await?;

    let stats = PaperStats::from_papers(&outcome.papers)
        .ok_or_else(|| AppError::not_found("Papers", &filters.query))?;

    Ok(Json(stats))
}
