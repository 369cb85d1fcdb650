use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use calorizz_db::DbPool;
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: DbPool,
    pub llm_provider: &'static str,
    pub llm_model: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentStatus {
    pub name: &'static str,
    pub status: Readiness,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: Readiness,
    pub version: &'static str,
    pub components: Vec<ComponentStatus>,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// `200` when the catalog is queryable, `503` otherwise. The model provider is
/// reported from configuration and never called.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let components = vec![
        catalog_status(&state.db_pool).await,
        ComponentStatus {
            name: "llm",
            status: Readiness::Ready,
            detail: format!("{} / {}", state.llm_provider, state.llm_model),
        },
    ];

    let status = if components.iter().all(|component| component.status == Readiness::Ready) {
        Readiness::Ready
    } else {
        Readiness::Degraded
    };
    let code = match status {
        Readiness::Ready => StatusCode::OK,
        Readiness::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    let report = HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION"),
        components,
        checked_at: Utc::now().to_rfc3339(),
    };
    (code, Json(report))
}

async fn catalog_status(pool: &DbPool) -> ComponentStatus {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products").fetch_one(pool).await {
        Ok(count) => ComponentStatus {
            name: "catalog",
            status: Readiness::Ready,
            detail: format!("{count} products"),
        },
        Err(error) => ComponentStatus {
            name: "catalog",
            status: Readiness::Degraded,
            detail: format!("catalog query failed: {error}"),
        },
    }
}
