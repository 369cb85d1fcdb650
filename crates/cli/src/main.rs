use std::process::ExitCode;

fn main() -> ExitCode {
    calorizz_cli::run()
}
