//! Result export

use axum::{
    extract::{Path, State},
    Json,
};
use std::str::FromStr;

use super::search::SearchRequest;
use crate::middleware::CurrentUser;
use crate::AppState;
use paperscope_common::{
    errors::{AppError, Result},
    scopus::PaperRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Excel,
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            other => Err(AppError::validation(
                "format",
                format!("Unknown export format: {}", other),
            )),
        }
    }
}

/// Run the search and return the papers as a JSON document.
/// Only JSON is produced; file formats are rejected before any remote call.
pub async fn export(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(format): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<PaperRecord>>> {
    let format: ExportFormat = format.parse()?;
    if format != ExportFormat::Json {
        return Err(AppError::validation(
            "format",
            format!("Export format {:?} is not supported, use json", format),
        ));
    }

    let filters = request.into_filters()?;
    let outcome = state
        .search_service_for(user.id)
        .await?
        .search_papers(&filters, true)
        .await?;

    if outcome.papers.is_empty() {
        return Err(AppError::not_found("Papers", &filters.query));
    }

    tracing::info!(user_id = %user.id, count = outcome.papers.len(), "Exported search results");
    Ok(Json(outcome.papers))
}
