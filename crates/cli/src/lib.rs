pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::{chat, doctor, migrate, seed};

#[derive(Debug, Parser)]
#[command(
    name = "calorizz",
    version,
    about = "Talk to Ri, the Calorizz product assistant, and manage its catalog",
    after_help = "Examples:\n  calorizz migrate\n  calorizz seed\n  calorizz chat\n  calorizz doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Interactive session with Ri; type exit or quit to leave")]
    Chat,
    #[command(about = "Bring the products schema up to date")]
    Migrate,
    #[command(about = "Load the demo menu into the catalog (safe to repeat)")]
    Seed,
    #[command(about = "Check configuration, model settings and the catalog database")]
    Doctor {
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let result = match Cli::parse().command {
        Command::Chat => chat::run(),
        Command::Migrate => migrate::run(),
        Command::Seed => seed::run(),
        Command::Doctor { json } => doctor::run(json),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
