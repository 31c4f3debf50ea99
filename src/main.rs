use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod city;
mod climate;
mod collect;
mod config;
mod export;
mod import;
mod logging;
mod source;
mod store;
mod weatherbox;

/// Collects climate tables of cities from Wikipedia weather boxes.
#[derive(Parser)]
#[command(version, long_version = env!("CLIMABOX_LONG_VERSION"), about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query Wikidata for cities and store their weather boxes
    Collect {
        db: PathBuf,

        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Skip cities that are already in the database
        #[arg(short = 'r', long)]
        resume: bool,

        #[arg(short = 'l', long)]
        limit: Option<usize>,
    },

    /// Write all stored cities as a JSON array
    Export {
        db: PathBuf,
        output: PathBuf,
    },

    /// Load a JSON array written by `export`
    Import {
        source: PathBuf,
        db: PathBuf,
    },
}

fn main() -> Result<()> {
    logging::configure_logging();

    let args = Cli::parse();

    match args.command {
        Commands::Collect {
            db,
            config,
            resume,
            limit,
        } => collect::run(
            db.as_path(),
            config.as_deref(),
            collect::Options { resume, limit },
        )
        .with_context(|| "could not run `collect`"),

        Commands::Export { db, output } => {
            export::run(db.as_path(), output.as_path()).with_context(|| "could not run `export`")
        }

        Commands::Import { source, db } => {
            import::run(source.as_path(), db.as_path()).with_context(|| "could not run `import`")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_collect_arguments() {
        let cli = Cli::try_parse_from(["climabox", "collect", "cities.db", "--resume", "-l", "5"])
            .unwrap();
        match cli.command {
            Commands::Collect {
                db,
                config,
                resume,
                limit,
            } => {
                assert_eq!(db, PathBuf::from("cities.db"));
                assert_eq!(config, None);
                assert!(resume);
                assert_eq!(limit, Some(5));
            }
            _ => panic!("expected collect"),
        }
    }
}
