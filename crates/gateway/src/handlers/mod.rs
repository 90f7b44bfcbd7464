//! API handlers module

pub mod api_keys;
pub mod auth;
pub mod author;
pub mod download;
pub mod export;
pub mod health;
pub mod search;
pub mod stats;
pub mod wishlist;
