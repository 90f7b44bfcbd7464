//! Database layer for Paperscope
//!
//! Provides:
//! - SeaORM entity models
//! - Repository pattern for data access
//! - Connection pool management
//! - Table creation from entity definitions

pub mod models;
mod repository;

pub use repository::{NewWishlistItem, Repository};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use models::{ApiKeyEntity, UserEntity, WishlistEntity};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    connection: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let connection = Database::connect(opts).await.map_err(|e| AppError::Configuration {
            message: format!("Failed to connect to database: {}", e),
        })?;

        info!("Database connection established");

        Ok(Self { connection })
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.connection
            .execute_unprepared("SELECT 1")
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    /// Create missing tables and indexes. Parents are created before children.
    pub async fn init_schema(&self) -> Result<()> {
        create_entity_tables(&self.connection, UserEntity).await?;
        create_entity_tables(&self.connection, ApiKeyEntity).await?;
        create_entity_tables(&self.connection, WishlistEntity).await?;
        info!("Database schema ready");
        Ok(())
    }
}

async fn create_entity_tables<E>(conn: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    conn.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        conn.execute(backend.build(&index)).await?;
    }

    Ok(())
}

/// Fresh in-memory SQLite database with the schema applied.
/// A single pooled connection keeps every query on the same database.
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..DatabaseConfig::default()
    };
    let pool = DbPool::new(&config).await.unwrap();
    pool.init_schema().await.unwrap();
    pool
}
