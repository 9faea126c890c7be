use std::process;

use clap::Parser;
use release_gate::cli::{Cli, EXIT_ERROR};
use release_gate::ui;

fn main() {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.execute() {
        Ok(code) => process::exit(code),
        Err(e) => {
            ui::display_error(&e.to_string());

            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("  Caused by: {err}");
                source = err.source();
            }

            process::exit(EXIT_ERROR);
        }
    }
}
