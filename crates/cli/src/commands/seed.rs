use calorizz_core::config::AppConfig;
use calorizz_db::{DemoCatalog, VerificationResult};

use crate::commands::{
    current_thread_runtime, load_config, open_migrated_pool, CommandResult, StepError,
};

const COMMAND: &str = "seed";

pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    match runtime.block_on(seed_demo_menu(&config)) {
        Ok(products) => CommandResult::success(
            COMMAND,
            format!("demo menu loaded ({} products): {}", products.len(), products.join(", ")),
        ),
        Err(error) => error.into_result(COMMAND),
    }
}

async fn seed_demo_menu(config: &AppConfig) -> Result<Vec<&'static str>, StepError> {
    let pool = open_migrated_pool(config).await?;

    let loaded = DemoCatalog::load(&pool).await;
    let verified = DemoCatalog::verify(&pool).await;
    pool.close().await;

    let seeded = loaded.map_err(|error| StepError::new("seed_execution", 5, error))?;
    let verification = verified.map_err(|error| StepError::new("seed_verification", 5, error))?;
    if !verification.all_present {
        return Err(StepError::new(
            "seed_verification",
            5,
            verification_failure_message(&verification),
        ));
    }
    Ok(seeded.products_seeded)
}

fn verification_failure_message(verification: &VerificationResult) -> String {
    let missing = verification
        .checks
        .iter()
        .filter_map(|(product_id, present)| (!present).then_some(*product_id))
        .collect::<Vec<_>>();

    if missing.is_empty() {
        "demo menu verification failed".to_string()
    } else {
        format!("demo menu verification failed for: {}", missing.join(", "))
    }
}
