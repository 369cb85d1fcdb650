use async_trait::async_trait;
use thiserror::Error;

use calorizz_core::domain::product::Product;

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Case-insensitive substring match on product name, at most `limit` rows.
    async fn search_by_name(
        &self,
        keyword: &str,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError>;
}
