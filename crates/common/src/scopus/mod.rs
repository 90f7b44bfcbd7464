//! Scopus search proxy core
//!
//! Query composition, page fetching, pagination, entry normalization and the
//! search service that ties them together behind the cache.

pub mod client;
pub mod normalize;
pub mod paginator;
pub mod query;
pub mod service;
pub mod stats;

pub use client::{build_http_client, PageFetcher, RawPage, ScopusClient};
pub use normalize::{normalize, PaperRecord};
pub use query::{build_query, DocumentType, SortBy, SubjectArea};
pub use service::{SearchFilters, SearchOutcome, SearchService, DEFAULT_LOOKUP_LIMIT};
pub use stats::PaperStats;
