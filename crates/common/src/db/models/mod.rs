//! SeaORM entity models
//!
//! Database entities for Paperscope

mod api_key;
mod user;
mod wishlist;

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use api_key::{
    Entity as ApiKeyEntity,
    Model as ApiKey,
    ActiveModel as ApiKeyActiveModel,
    Column as ApiKeyColumn,
};

pub use wishlist::{
    Entity as WishlistEntity,
    Model as WishlistItem,
    ActiveModel as WishlistActiveModel,
    Column as WishlistColumn,
};
