//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// zakatek - offline cache manager for the Wesoły Zakątek site
#[derive(Debug, Parser)]
#[command(name = "zakatek")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides ZAKATEK_CONFIG_FILE)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep the cache in memory instead of the SQLite database
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// Treat the network as unreachable
    #[arg(long, global = true)]
    pub offline: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Precache the manifest as the configured generation
    Install,

    /// Drop every generation except the configured one
    Activate,

    /// Install, then activate
    Update,

    /// Answer a request the way a controlled page would see it
    Fetch {
        /// Path or absolute URL to request
        locator: String,

        /// Issue the request as a top-level navigation
        #[arg(long)]
        navigate: bool,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Write the body to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored generations
    Generations {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List the entries of a generation (default: the configured one)
    Entries {
        generation: Option<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_navigate() {
        let cli = Cli::try_parse_from(["zakatek", "fetch", "/missing-page", "--navigate"]).unwrap();
        match cli.command {
            Commands::Fetch { locator, navigate, method, output } => {
                assert_eq!(locator, "/missing-page");
                assert!(navigate);
                assert_eq!(method, "GET");
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["zakatek", "update", "--in-memory", "--offline", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::Update));
        assert!(cli.in_memory);
        assert!(cli.offline);
        assert!(cli.verbose);
    }

    #[test]
    fn test_entries_optional_generation() {
        let cli = Cli::try_parse_from(["zakatek", "entries", "wesoly-zakatek-v1.0", "--json"]).unwrap();
        match cli.command {
            Commands::Entries { generation, json } => {
                assert_eq!(generation.as_deref(), Some("wesoly-zakatek-v1.0"));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_fetch_requires_locator() {
        assert!(Cli::try_parse_from(["zakatek", "fetch"]).is_err());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
