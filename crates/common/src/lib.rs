//! Paperscope Common Library
//!
//! Shared code for the Paperscope gateway including:
//! - Configuration management
//! - Error types and handling
//! - Authentication and credential encryption
//! - Database models and repository
//! - Search result cache
//! - Scopus search orchestration
//! - Metrics

pub mod auth;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod scopus;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
