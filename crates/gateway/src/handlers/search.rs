//! Search handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::middleware::CurrentUser;
use crate::AppState;
use paperscope_common::{
    cache::keys,
    errors::{AppError, Result},
    scopus::{DocumentType, PaperRecord, SearchFilters, SortBy, SubjectArea},
};

fn default_limit() -> u32 { 25 }
fn first_page() -> u32 { 1 }
fn default_min_citations() -> u64 { 100 }
fn default_highly_cited_limit() -> u32 { 50 }

/// Filtered search request, shared by search, stats and export
#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    /// Page size
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: u32,

    #[validate(range(min = 1900, max = 2100))]
    pub year_from: Option<i32>,

    #[validate(range(min = 1900, max = 2100))]
    pub year_to: Option<i32>,

    pub document_type: Option<DocumentType>,

    #[serde(default)]
    pub subject_areas: Option<Vec<SubjectArea>>,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default = "first_page")]
    #[validate(range(min = 1))]
    pub page: u32,
}

impl SearchRequest {
    /// Validate and convert into service filters
    pub fn into_filters(self) -> Result<SearchFilters> {
        self.validate()?;
        check_query(&self.query)?;
        check_year_range(self.year_from, self.year_to)?;

        Ok(SearchFilters {
            query: self.query,
            limit: self.limit,
            year_from: self.year_from,
            year_to: self.year_to,
            document_type: self.document_type,
            subject_areas: self.subject_areas.unwrap_or_default(),
            sort_by: self.sort_by,
            page: self.page,
        })
    }
}

fn check_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(AppError::validation("query", "query must not be blank"));
    }
    Ok(())
}

fn check_year_range(year_from: Option<i32>, year_to: Option<i32>) -> Result<()> {
    match (year_from, year_to) {
        (Some(from), Some(to)) if from > to => Err(AppError::validation(
            "year_from",
            "year_from must not be later than year_to",
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total_available: u64,
    pub returned_count: usize,
    pub query: String,
    pub page: u32,
    pub total_pages: u64,
    pub papers: Vec<PaperRecord>,
    /// Seconds
    pub execution_time: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuickSearchParams {
    #[validate(length(min = 1, max = 1000))]
    pub q: String,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: u32,

    #[validate(range(min = 1900, max = 2100))]
    pub year_from: Option<i32>,

    #[validate(range(min = 1900, max = 2100))]
    pub year_to: Option<i32>,

    #[serde(default)]
    pub sort: SortBy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuickSearchResponse {
    pub query: String,
    pub returned_count: usize,
    pub papers: Vec<PaperRecord>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HighlyCitedParams {
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    #[serde(default = "default_min_citations")]
    #[validate(range(min = 1))]
    pub min_citations: u64,

    #[serde(default = "default_highly_cited_limit")]
    #[validate(range(min = 1, max = 500))]
    pub limit: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlyCitedResponse {
    pub query: String,
    pub min_citations: u64,
    pub total_found: usize,
    pub papers: Vec<PaperRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
    pub backend: String,
}

/// Number of pages of `limit` results needed to cover `total`
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

/// Filtered, paginated search. A page past the end is served as the last page.
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();
    let mut filters = request.into_filters()?;
    let service = state.search_service_for(user.id).await?;

    let mut outcome = service.search_papers(&filters, true).await?;
    let mut pages = total_pages(outcome.total_available, filters.limit);

    if pages > 0 && u64::from(filters.page) > pages {
        let last_page = u32::try_from(pages).unwrap_or(u32::MAX);
        tracing::debug!(
            requested = filters.page,
            last_page,
            "Requested page past the end, serving last page"
        );
        filters.page = last_page;
        outcome = service.search_papers(&filters, true).await?;
        pages = total_pages(outcome.total_available, filters.limit);
    }

    let execution_time = start.elapsed().as_secs_f64();

    tracing::info!(
        user_id = %user.id,
        query = %outcome.query,
        page = filters.page,
        results = outcome.papers.len(),
        execution_time,
        "Search request served"
    );

    Ok(Json(SearchResponse {
        total_available: outcome.total_available,
        returned_count: outcome.papers.len(),
        query: outcome.query,
        page: filters.page,
        total_pages: pages,
        papers: outcome.papers,
        execution_time,
    }))
}

/// GET variant with a reduced filter set
pub async fn quick_search(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<QuickSearchParams>,
) -> Result<Json<QuickSearchResponse>> {
    params.validate()?;
    check_query(&params.q)?;
    check_year_range(params.year_from, params.year_to)?;

    let mut filters = SearchFilters::new(params.q.clone(), params.limit);
    filters.year_from = params.year_from;
    filters.year_to = params.year_to;
    filters.sort_by = params.sort;

    let outcome = state
        .search_service_for(user.id)
        .await?
        .search_papers(&filters, true)
        .await?;

    Ok(Json(QuickSearchResponse {
        query: params.q,
        returned_count: outcome.papers.len(),
        papers: outcome.papers,
    }))
}

/// Most cited papers for a query, keeping those at or above a citation floor
pub async fn highly_cited(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<HighlyCitedParams>,
) -> Result<Json<HighlyCitedResponse>> {
    params.validate()?;
    check_query(&params.query)?;

    let mut filters = SearchFilters::new(params.query.clone(), params.limit);
    filters.sort_by = SortBy::Citations;

    let outcome = state
        .search_service_for(user.id)
        .await?
        .search_papers(&filters, true)
        .await?;

    let papers: Vec<PaperRecord> = outcome
        .papers
        .into_iter()
        .filter(|paper| paper.cited_by >= params.min_citations)
        .collect();

    Ok(Json(HighlyCitedResponse {
        query: params.query,
        min_citations: params.min_citations,
        total_found: papers.len(),
        papers,
    }))
}

/// Drop every cached search result set
pub async fn clear_cache(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<ClearCacheResponse> {
    let removed = state.cache.invalidate(keys::ALL_SEARCHES).await;
    tracing::info!(user_id = %user.id, removed, "Search cache cleared");

    Json(ClearCacheResponse {
        removed,
        backend: state.cache.backend().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> SearchRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_defaults_and_wire_codes() {
        let filters = request(json!({
            "query": "machine learning",
            "document_type": "ar",
            "subject_areas": ["COMP", "MEDI"],
            "sort_by": "-date",
        }))
        .into_filters()
        .unwrap();

        assert_eq!(filters.limit, 25);
        assert_eq!(filters.page, 1);
        assert_eq!(filters.document_type, Some(DocumentType::Article));
        assert_eq!(
            filters.subject_areas,
            vec![SubjectArea::ComputerScience, SubjectArea::Medicine]
        );
        assert_eq!(filters.sort_by, SortBy::DateNewest);
    }

    #[test]
    fn test_sort_defaults_to_citations() {
        let filters = request(json!({"query": "q"})).into_filters().unwrap();
        assert_eq!(filters.sort_by, SortBy::Citations);
        assert!(filters.subject_areas.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let err = request(json!({"query": "q", "limit": 0})).into_filters().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = request(json!({"query": "q", "limit": 1001})).into_filters().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = request(json!({"query": "q", "year_from": 1800})).into_filters().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = request(json!({"query": "q", "page": 0})).into_filters().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_rejects_blank_query_and_inverted_years() {
        let err = request(json!({"query": "   "})).into_filters().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = request(json!({"query": "q", "year_from": 2024, "year_to": 2020}))
            .into_filters()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "year_from"));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 25), 0);
        assert_eq!(total_pages(1, 25), 1);
        assert_eq!(total_pages(25, 25), 1);
        assert_eq!(total_pages(26, 25), 2);
        assert_eq!(total_pages(10, 0), 0);
    }
}
