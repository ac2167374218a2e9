use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wpflow::cli::{Cli, Commands};
use wpflow::commands::{init_config, run_check, CheckConfig};

fn main() -> Result<()> {
    // RUST_LOG=wpflow=debug shows per-file scan statistics
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            paths,
            format,
            output,
            config,
            jobs,
            exclude,
        } => {
            let totals = run_check(CheckConfig {
                paths,
                format,
                output,
                config,
                jobs,
                exclude,
            })?;
            if totals.errors > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Init { force } => init_config(force),
    }
}
