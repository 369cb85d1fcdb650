use calorizz_core::config::{AppConfig, LoadOptions};
use calorizz_db::{connect_with_settings, DbPool};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::{current_thread_runtime, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct Check {
    name: &'static str,
    status: CheckStatus,
    details: String,
    #[serde(skip)]
    exit_code: u8,
}

impl Check {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into(), exit_code: 0 }
    }

    fn fail(name: &'static str, exit_code: u8, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into(), exit_code }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: reason.to_string(), exit_code: 0 }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    overall_status: CheckStatus,
    checks: Vec<Check>,
}

impl Report {
    fn new(checks: Vec<Check>) -> Self {
        let overall_status = if checks.iter().any(|check| check.status == CheckStatus::Fail) {
            CheckStatus::Fail
        } else {
            CheckStatus::Pass
        };
        Self { overall_status, checks }
    }

    /// Exit code of the first failing check, or 0.
    fn exit_code(&self) -> u8 {
        self.checks
            .iter()
            .find(|check| check.status == CheckStatus::Fail)
            .map_or(0, |check| check.exit_code)
    }

    fn render(&self) -> String {
        let headline = match self.overall_status {
            CheckStatus::Pass => "calorizz doctor: ready",
            _ => "calorizz doctor: not ready",
        };
        let mut out = String::from(headline);
        for check in &self.checks {
            let marker = match check.status {
                CheckStatus::Pass => "ok",
                CheckStatus::Fail => "fail",
                CheckStatus::Skipped => "skip",
            };
            out.push_str(&format!("\n  {marker:<4} {:<22} {}", check.name, check.details));
        }
        out
    }
}

/// Readiness report for the local setup; never touches the language model.
pub fn run(json_output: bool) -> CommandResult {
    let report = Report::new(collect_checks());
    let exit_code = report.exit_code();

    let output = if json_output {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => json,
            Err(error) => {
                return CommandResult::failure("doctor", "serialization", error.to_string(), 3);
            }
        }
    } else {
        report.render()
    };

    CommandResult { exit_code, output }
}

fn collect_checks() -> Vec<Check> {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let reason = "configuration did not load";
            return vec![
                Check::fail("config_validation", 2, error.to_string()),
                Check::skipped("llm_settings", reason),
                Check::skipped("database_connectivity", reason),
                Check::skipped("product_catalog", reason),
            ];
        }
    };

    let mut checks = vec![Check::pass("config_validation", "configuration loaded and validated")];
    checks.push(llm_settings(&config));

    let runtime = match current_thread_runtime("doctor") {
        Ok(runtime) => runtime,
        Err(failure) => {
            checks.push(Check::fail("database_connectivity", failure.exit_code, failure.output));
            checks.push(Check::skipped("product_catalog", "no async runtime"));
            return checks;
        }
    };
    checks.extend(runtime.block_on(database_checks(&config)));
    checks
}

fn llm_settings(config: &AppConfig) -> Check {
    let llm = &config.llm;
    let has_key = llm.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty());

    if llm.provider.requires_api_key() && !has_key {
        return Check::fail(
            "llm_settings",
            2,
            format!("{} provider needs an api key", llm.provider.as_str()),
        );
    }

    Check::pass(
        "llm_settings",
        format!(
            "{} `{}` at {} (api key {})",
            llm.provider.as_str(),
            llm.model,
            llm.endpoint_base(),
            if has_key { "set" } else { "not set" }
        ),
    )
}

async fn database_checks(config: &AppConfig) -> Vec<Check> {
    let database = &config.database;
    let connected =
        connect_with_settings(&database.url, database.max_connections, database.timeout_secs).await;
    let pool = match connected {
        Ok(pool) => pool,
        Err(error) => {
            return vec![
                Check::fail("database_connectivity", 4, format!("cannot connect: {error}")),
                Check::skipped("product_catalog", "database is unreachable"),
            ];
        }
    };

    let checks = vec![
        Check::pass("database_connectivity", format!("connected to `{}`", database.url)),
        catalog_check(&pool).await,
    ];
    pool.close().await;
    checks
}

async fn catalog_check(pool: &DbPool) -> Check {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products").fetch_one(pool).await {
        Ok(0) => Check::pass("product_catalog", "table is empty, `calorizz seed` loads the demo menu"),
        Ok(count) => Check::pass("product_catalog", format!("{count} products available")),
        Err(error) => Check::fail(
            "product_catalog",
            5,
            format!("products table not readable ({error}); run `calorizz migrate`"),
        ),
    }
}
