use crate::commands::{
    current_thread_runtime, load_config, open_migrated_pool, CommandResult, StepError,
};

const COMMAND: &str = "migrate";

pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let migrated = runtime.block_on(async {
        let pool = open_migrated_pool(&config).await?;
        pool.close().await;
        Ok::<(), StepError>(())
    });

    match migrated {
        Ok(()) => CommandResult::success(
            COMMAND,
            format!("schema is current on `{}`", config.database.url),
        ),
        Err(error) => error.into_result(COMMAND),
    }
}
