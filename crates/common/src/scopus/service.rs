//! Search orchestration: query building, pagination, normalization and caching.

use super::client::PageFetcher;
use super::normalize::{is_error_entry, normalize, PaperRecord};
use super::paginator;
use super::query::{
    affiliation_query, author_query, build_query, eid_query, DocumentType, SortBy, SubjectArea,
};
use crate::cache::{keys, Cache};
use crate::errors::Result;
use crate::metrics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default page size for the author and affiliation lookups
pub const DEFAULT_LOOKUP_LIMIT: u32 = 25;

/// A search request after validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub query: String,
    pub limit: u32,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub document_type: Option<DocumentType>,
    pub subject_areas: Vec<SubjectArea>,
    pub sort_by: SortBy,
    /// 1-based
    pub page: u32,
}

impl SearchFilters {
    pub fn new(query: impl Into<String>, limit: u32) -> Self {
        Self {
            query: query.into(),
            limit,
            year_from: None,
            year_to: None,
            document_type: None,
            subject_areas: Vec::new(),
            sort_by: SortBy::default(),
            page: 1,
        }
    }

    /// Zero-based offset of the first result on the requested page
    pub fn start(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }

    /// Cache key. Subject areas are sorted so selection order does not matter.
    pub fn cache_key(&self) -> String {
        let mut canonical = self.clone();
        canonical.subject_areas.sort_by_key(|area| area.code());
        canonical.subject_areas.dedup();
        canonical.page = canonical.page.max(1);
        keys::search(&canonical)
    }
}

/// Result of one search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub papers: Vec<PaperRecord>,
    /// The query string actually sent upstream
    pub query: String,
    pub total_available: u64,
}

/// Search service over one page source, optionally cached
pub struct SearchService<F> {
    fetcher: F,
    cache: Option<Arc<Cache>>,
}

impl<F: PageFetcher> SearchService<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run a filtered search for one page of results
    pub async fn search_papers(&self, filters: &SearchFilters, use_cache: bool) -> Result<SearchOutcome> {
        let started = Instant::now();
        let cache = if use_cache { self.cache.as_deref() } else { None };
        let cache_key = filters.cache_key();

        if let Some(cache) = cache {
            if let Some(outcome) = cache.get::<SearchOutcome>(&cache_key).await {
                debug!(key = %cache_key, "Serving search from cache");
                metrics::record_search(started.elapsed().as_secs_f64(), "cache", outcome.papers.len());
                return Ok(outcome);
            }
        }

        let query = build_query(
            &filters.query,
            filters.year_from,
            filters.year_to,
            filters.document_type,
            &filters.subject_areas,
        );

        let (entries, total_available) = paginator::collect(
            &self.fetcher,
            &query,
            filters.limit,
            filters.sort_by,
            filters.start(),
        )
        .await?;

        let outcome = SearchOutcome {
            papers: normalize_entries(&entries),
            query,
            total_available,
        };

        if let Some(cache) = cache {
            cache.set(&cache_key, &outcome).await;
        }

        let elapsed = started.elapsed().as_secs_f64();
        metrics::record_search(elapsed, "remote", outcome.papers.len());
        info!(
            query = %outcome.query,
            page = filters.page,
            returned = outcome.papers.len(),
            total_available = outcome.total_available,
            elapsed_secs = elapsed,
            "Search completed"
        );

        Ok(outcome)
    }

    /// Papers by an author name, most cited first
    pub async fn search_by_author(&self, name: &str, limit: u32) -> Result<Vec<PaperRecord>> {
        self.single_clause(&author_query(name), limit).await
    }

    /// Papers from an institution, most cited first
    pub async fn search_by_affiliation(&self, institution: &str, limit: u32) -> Result<Vec<PaperRecord>> {
        self.single_clause(&affiliation_query(institution), limit).await
    }

    /// Look up one paper by its Scopus EID
    pub async fn get_paper_by_eid(&self, eid: &str) -> Result<Option<PaperRecord>> {
        let page = self
            .fetcher
            .fetch_page(&eid_query(eid), 1, 0, SortBy::default())
            .await?;

        Ok(page
            .entries
            .iter()
            .find(|entry| !is_error_entry(entry))
            .map(normalize))
    }

    async fn single_clause(&self, query: &str, limit: u32) -> Result<Vec<PaperRecord>> {
        let (entries, _) =
            paginator::collect(&self.fetcher, query, limit, SortBy::default(), 0).await?;
        Ok(normalize_entries(&entries))
    }
}

fn normalize_entries(entries: &[Value]) -> Vec<PaperRecord> {
    entries
        .iter()
        .filter(|entry| !is_error_entry(entry))
        .map(normalize)
        .collect()
}
