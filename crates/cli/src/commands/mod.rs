pub mod chat;
pub mod doctor;
pub mod migrate;
pub mod seed;

use calorizz_core::config::{AppConfig, LoadOptions};
use calorizz_db::{connect_with_settings, migrations, DbPool};
use serde_json::json;
use tokio::runtime::Runtime;

/// A failed step inside a command, before it is rendered as output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StepError {
    pub class: &'static str,
    pub message: String,
    pub exit_code: u8,
}

impl StepError {
    pub fn new(class: &'static str, exit_code: u8, message: impl ToString) -> Self {
        Self { class, message: message.to_string(), exit_code }
    }

    pub fn into_result(self, command: &str) -> CommandResult {
        CommandResult::failure(command, self.class, self.message, self.exit_code)
    }
}

/// Exit code plus whatever the command prints to stdout.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    /// Exit without printing anything; used after interactive sessions.
    pub fn quiet_success() -> Self {
        Self { exit_code: 0, output: String::new() }
    }

    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self { exit_code: 0, output: outcome_json(command, None, &message.into()) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self { exit_code, output: outcome_json(command, Some(error_class), &message.into()) }
    }
}

fn outcome_json(command: &str, error_class: Option<&str>, message: &str) -> String {
    let status = if error_class.is_some() { "error" } else { "ok" };
    json!({
        "command": command,
        "status": status,
        "error_class": error_class,
        "message": message,
    })
    .to_string()
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        StepError::new("config_validation", 2, format!("configuration issue: {error}"))
            .into_result(command)
    })
}

pub(crate) fn current_thread_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        StepError::new("runtime_init", 3, format!("failed to initialize async runtime: {error}"))
            .into_result(command)
    })
}

/// Connects with the configured pool settings and applies pending migrations.
pub(crate) async fn open_migrated_pool(config: &AppConfig) -> Result<DbPool, StepError> {
    let database = &config.database;
    let pool =
        connect_with_settings(&database.url, database.max_connections, database.timeout_secs)
            .await
            .map_err(|error| StepError::new("db_connectivity", 4, error))?;

    if let Err(error) = migrations::run_pending(&pool).await {
        pool.close().await;
        return Err(StepError::new("migration", 5, error));
    }
    Ok(pool)
}
