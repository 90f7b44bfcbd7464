//! Repository pattern for database operations
//!
//! Every user-owned query is scoped by `user_id`, so a caller can never read
//! or mutate another user's keys or wishlist.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Paper snapshot to store in a wishlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWishlistItem {
    pub title: String,
    pub authors: Option<String>,
    pub year: Option<String>,
    pub publication: Option<String>,
    pub cited_by: i32,
    pub doi: Option<String>,
    pub eid: Option<String>,
    pub scopus_url: Option<String>,
    pub notes: Option<String>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user. Emails are unique.
    pub async fn create_user(&self, email: &str, hashed_password: String) -> Result<User> {
        if self.find_user_by_email(email).await?.is_some() {
            return Err(AppError::Conflict {
                message: "Email already registered".to_string(),
            });
        }

        let now = chrono::Utc::now();
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            hashed_password: Set(hashed_password),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        user.insert(self.conn()).await.map_err(Into::into)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a user together with their keys and wishlist
    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let txn = self.conn().begin().await?;

        ApiKeyEntity::delete_many()
            .filter(ApiKeyColumn::UserId.eq(id))
            .exec(&txn)
            .await?;
        WishlistEntity::delete_many()
            .filter(WishlistColumn::UserId.eq(id))
            .exec(&txn)
            .await?;
        let result = UserEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // API Key Operations
    // ========================================================================

    /// Store an already-encrypted key
    pub async fn create_api_key(
        &self,
        user_id: Uuid,
        key_name: String,
        encrypted_key: String,
        key_hint: String,
    ) -> Result<ApiKey> {
        let key = ApiKeyActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            key_name: Set(key_name),
            encrypted_key: Set(encrypted_key),
            key_hint: Set(key_hint),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        };

        key.insert(self.conn()).await.map_err(Into::into)
    }

    /// List a user's keys, oldest first
    pub async fn list_api_keys(&self, user_id: Uuid) -> Result<Vec<ApiKey>> {
        ApiKeyEntity::find()
            .filter(ApiKeyColumn::UserId.eq(user_id))
            .order_by_asc(ApiKeyColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// The key searches run with: the oldest active one
    pub async fn find_active_api_key(&self, user_id: Uuid) -> Result<Option<ApiKey>> {
        ApiKeyEntity::find()
            .filter(ApiKeyColumn::UserId.eq(user_id))
            .filter(ApiKeyColumn::IsActive.eq(true))
            .order_by_asc(ApiKeyColumn::CreatedAt)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Delete one of a user's keys
    pub async fn delete_api_key(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = ApiKeyEntity::delete_many()
            .filter(ApiKeyColumn::Id.eq(id))
            .filter(ApiKeyColumn::UserId.eq(user_id))
            .exec(self.conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Flip a key's active flag
    pub async fn toggle_api_key(&self, user_id: Uuid, id: Uuid) -> Result<ApiKey> {
        let key = ApiKeyEntity::find_by_id(id)
            .filter(ApiKeyColumn::UserId.eq(user_id))
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::not_found("API key", id))?;

        let is_active = key.is_active;
        let mut active: ApiKeyActiveModel = key.into();
        active.is_active = Set(!is_active);
        active.update(self.conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Wishlist Operations
    // ========================================================================

    /// Add a paper to a user's wishlist. A paper with an EID is stored once per user.
    pub async fn create_wishlist_item(
        &self,
        user_id: Uuid,
        item: NewWishlistItem,
    ) -> Result<WishlistItem> {
        if let Some(eid) = item.eid.as_deref() {
            if self.find_wishlist_item_by_eid(user_id, eid).await?.is_some() {
                return Err(AppError::Duplicate {
                    message: "Paper already in wishlist".to_string(),
                });
            }
        }

        let model = WishlistActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(item.title),
            authors: Set(item.authors),
            year: Set(item.year),
            publication: Set(item.publication),
            cited_by: Set(item.cited_by),
            doi: Set(item.doi),
            eid: Set(item.eid),
            scopus_url: Set(item.scopus_url),
            notes: Set(item.notes),
            created_at: Set(chrono::Utc::now().into()),
        };

        model.insert(self.conn()).await.map_err(Into::into)
    }

    /// A user's wishlist, newest first
    pub async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>> {
        WishlistEntity::find()
            .filter(WishlistColumn::UserId.eq(user_id))
            .order_by_desc(WishlistColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_wishlist_item(&self, user_id: Uuid, id: Uuid) -> Result<Option<WishlistItem>> {
        WishlistEntity::find_by_id(id)
            .filter(WishlistColumn::UserId.eq(user_id))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_wishlist_item_by_eid(
        &self,
        user_id: Uuid,
        eid: &str,
    ) -> Result<Option<WishlistItem>> {
        WishlistEntity::find()
            .filter(WishlistColumn::UserId.eq(user_id))
            .filter(WishlistColumn::Eid.eq(eid))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn delete_wishlist_item(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = WishlistEntity::delete_many()
            .filter(WishlistColumn::Id.eq(id))
            .filter(WishlistColumn::UserId.eq(user_id))
            .exec(self.conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Replace the notes on a wishlist item
    pub async fn update_wishlist_notes(
        &self,
        user_id: Uuid,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<WishlistItem> {
        let item = self
            .find_wishlist_item(user_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Wishlist item", id))?;

        let mut active: WishlistActiveModel = item.into();
        active.notes = Set(notes);
        active.update(self.conn()).await.map_err(Into::into)
    }
}
