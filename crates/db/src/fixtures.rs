use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Demo menu used by `calorizz seed` and local smoke runs.
const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        id: "demo-ayam-goreng",
        name: "Ayam Goreng",
        price: "15000",
        description: "Ayam goreng crispy bumbu kuning",
    },
    DemoProduct {
        id: "demo-ayam-bakar-madu",
        name: "Ayam Bakar Madu",
        price: "18000",
        description: "Ayam bakar olesan madu dan kecap",
    },
    DemoProduct {
        id: "demo-ayam-geprek",
        name: "Ayam Geprek",
        price: "17000",
        description: "Ayam crispy geprek sambal bawang",
    },
    DemoProduct {
        id: "demo-nasi-goreng",
        name: "Nasi Goreng Spesial",
        price: "20000",
        description: "Nasi goreng telur, ayam suwir, kerupuk",
    },
    DemoProduct {
        id: "demo-nasi-uduk",
        name: "Nasi Uduk",
        price: "12000",
        description: "Nasi uduk lengkap dengan orek tempe",
    },
    DemoProduct {
        id: "demo-mie-ayam",
        name: "Mie Ayam",
        price: "13000",
        description: "Mie ayam jamur dengan pangsit",
    },
    DemoProduct {
        id: "demo-bakso-urat",
        name: "Bakso Urat",
        price: "15000",
        description: "Bakso urat kuah kaldu sapi",
    },
    DemoProduct {
        id: "demo-sate-ayam",
        name: "Sate Ayam",
        price: "20000",
        description: "10 tusuk sate ayam bumbu kacang",
    },
    DemoProduct {
        id: "demo-soto-ayam",
        name: "Soto Ayam",
        price: "16000",
        description: "Soto ayam kuah kuning dengan koya",
    },
    DemoProduct {
        id: "demo-gado-gado",
        name: "Gado-Gado",
        price: "14000",
        description: "Sayur rebus dengan saus kacang",
    },
    DemoProduct {
        id: "demo-rendang",
        name: "Rendang Sapi",
        price: "25000",
        description: "Rendang daging sapi khas Padang",
    },
    DemoProduct {
        id: "demo-es-teh",
        name: "Es Teh Manis",
        price: "5000",
        description: "Teh manis dingin",
    },
    DemoProduct {
        id: "demo-es-jeruk",
        name: "Es Jeruk",
        price: "7000",
        description: "Jeruk peras segar",
    },
    DemoProduct {
        id: "demo-jus-alpukat",
        name: "Jus Alpukat",
        price: "12000",
        description: "Jus alpukat dengan susu cokelat",
    },
    DemoProduct {
        id: "demo-kopi-aren",
        name: "Kopi Susu Gula Aren",
        price: "18000",
        description: "Es kopi susu dengan gula aren",
    },
];

struct DemoProduct {
    id: &'static str,
    name: &'static str,
    price: &'static str,
    description: &'static str,
}

pub struct DemoCatalog;

impl DemoCatalog {
    pub fn product_count() -> usize {
        DEMO_PRODUCTS.len()
    }

    /// Upserts the demo menu. Running it twice leaves the table unchanged.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        for product in DEMO_PRODUCTS {
            sqlx::query(
                "INSERT INTO products (id, name, price, description)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    price = excluded.price,
                    description = excluded.description,
                    updated_at = datetime('now')",
            )
            .bind(product.id)
            .bind(product.name)
            .bind(product.price)
            .bind(product.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult {
            products_seeded: DEMO_PRODUCTS.iter().map(|product| product.name).collect(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(DEMO_PRODUCTS.len());

        for product in DEMO_PRODUCTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = ?1 AND name = ?2 AND price = ?3)",
            )
            .bind(product.id)
            .bind(product.name)
            .bind(product.price)
            .fetch_one(pool)
            .await?;
            checks.push((product.id, present == 1));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug, Clone)]
pub struct SeedResult {
    pub products_seeded: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
