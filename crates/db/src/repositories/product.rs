use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use calorizz_core::config::MAX_LOOKUP_LIMIT;
use calorizz_core::domain::product::Product;

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const SEARCH_BY_NAME_SQL: &str = "SELECT name, price, description FROM products \
     WHERE name LIKE ? ESCAPE '\\' \
     ORDER BY name \
     LIMIT ?";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE metacharacters so the keyword only ever matches literally.
pub(crate) fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: Option<String> =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let price = Decimal::from_str(price.trim())
        .map_err(|e| RepositoryError::Decode(format!("invalid price `{price}` for `{name}`: {e}")))?;

    Ok(Product { name, price, description: description.unwrap_or_default() })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn search_by_name(
        &self,
        keyword: &str,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        let limit = i64::from(limit.clamp(1, MAX_LOOKUP_LIMIT));

        // Dropped on every return path, handing the connection back to the pool.
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query(SEARCH_BY_NAME_SQL)
            .bind(like_pattern(keyword))
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?;

        rows.iter().map(row_to_product).collect()
    }
}
