//! Print the effective console config (defaults + env overrides) as JSON.

use config_console_config::{ConsoleConfig, ConsoleEnv, apply_env_overrides, to_pretty_json};
use std::io;
use std::io::Write;

fn main() -> std::process::ExitCode {
    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::ExitCode::from(2)
        },
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let env = ConsoleEnv::from_std_env()?;
    let config = apply_env_overrides(ConsoleConfig::default(), &env)?;
    let output = to_pretty_json(config.as_ref())?;

    let mut stdout = io::stdout();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
