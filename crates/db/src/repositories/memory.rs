use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use calorizz_core::config::MAX_LOOKUP_LIMIT;
use calorizz_core::domain::product::Product;

use super::{ProductRepository, RepositoryError};

/// Catalog held in memory; counts every search so callers can assert on traffic.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
    searches: AtomicUsize,
}

impl InMemoryProductRepository {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products), searches: AtomicUsize::new(0) }
    }

    pub async fn insert(&self, product: Product) {
        self.products.write().await.push(product);
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn search_by_name(
        &self,
        keyword: &str,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.clamp(1, MAX_LOOKUP_LIMIT) as usize;

        let products = self.products.read().await;
        let mut matches = products
            .iter()
            .filter(|product| product.name.to_lowercase().contains(&needle))
            .cloned()
            .collect::<Vec<_>>();
        matches.sort_by(|left, right| left.name.cmp(&right.name));
        matches.truncate(limit);

        Ok(matches)
    }
}
