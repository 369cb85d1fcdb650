use std::sync::Arc;

use tracing::{info, warn};

use calorizz_core::config::MAX_LOOKUP_LIMIT;
use calorizz_core::domain::intent::Keyword;
use calorizz_core::domain::product::Product;
use calorizz_db::ProductRepository;

#[derive(Clone, Debug, PartialEq)]
pub enum LookupOutcome {
    Found(Vec<Product>),
    NotFound,
    Unavailable(String),
}

impl LookupOutcome {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Found(products) => products.len(),
            Self::NotFound | Self::Unavailable(_) => 0,
        }
    }
}

pub struct ProductLookup {
    products: Arc<dyn ProductRepository>,
    limit: u32,
}

impl ProductLookup {
    pub fn new(products: Arc<dyn ProductRepository>, limit: u32) -> Self {
        Self { products, limit: limit.clamp(1, MAX_LOOKUP_LIMIT) }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Searches the catalog; storage failures become [`LookupOutcome::Unavailable`].
    pub async fn lookup(&self, keyword: &Keyword) -> LookupOutcome {
        match self.products.search_by_name(keyword.as_str(), self.limit).await {
            Ok(mut products) if !products.is_empty() => {
                products.truncate(self.limit as usize);
                info!(
                    event_name = "agent.lookup.found",
                    keyword = %keyword,
                    rows = products.len(),
                    "catalog lookup returned products"
                );
                LookupOutcome::Found(products)
            }
            Ok(_) => {
                info!(
                    event_name = "agent.lookup.not_found",
                    keyword = %keyword,
                    rows = 0,
                    "catalog lookup returned nothing"
                );
                LookupOutcome::NotFound
            }
            Err(error) => {
                warn!(
                    event_name = "agent.lookup.unavailable",
                    keyword = %keyword,
                    error = %error,
                    "catalog lookup failed, replying without product data"
                );
                LookupOutcome::Unavailable(error.to_string())
            }
        }
    }
}
