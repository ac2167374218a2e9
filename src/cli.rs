use crate::io::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wpflow")]
#[command(about = "Nonce verification and slashing contract checks for WordPress PHP", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check PHP files (or JSON token dumps) for unverified input and slashing contracts
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format (defaults to the configured format, then terminal)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to the nearest .wpflow.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of worker threads (0 = one per core)
        #[arg(short = 'j', long = "jobs", default_value = "0", env = "WPFLOW_JOBS")]
        jobs: usize,

        /// Glob patterns of paths to skip, added to the configured ones
        #[arg(long = "exclude", value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_check_command() {
        let args = vec![
            "wpflow",
            "check",
            "plugin/",
            "theme/functions.php",
            "--format",
            "json",
            "--jobs",
            "2",
            "--exclude",
            "vendor/**,node_modules/**",
        ];

        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Check {
                paths,
                format,
                output,
                config,
                jobs,
                exclude,
            } => {
                assert_eq!(
                    paths,
                    vec![PathBuf::from("plugin/"), PathBuf::from("theme/functions.php")]
                );
                assert_eq!(format, Some(OutputFormat::Json));
                assert_eq!(output, None);
                assert_eq!(config, None);
                assert_eq!(jobs, 2);
                assert_eq!(exclude, vec!["vendor/**", "node_modules/**"]);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_parsing_init_command() {
        let cli = Cli::parse_from(vec!["wpflow", "init", "--force"]);

        match cli.command {
            Commands::Init { force } => assert!(force),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_check_requires_a_path() {
        assert!(Cli::try_parse_from(vec!["wpflow", "check"]).is_err());
    }
}
