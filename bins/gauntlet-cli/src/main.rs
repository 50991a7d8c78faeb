mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gauntlet-cli")]
#[command(about = "Gauntlet CLI - Grade submissions and verify challenges locally", long_about = None)]
struct Cli {
    /// Path to the language profile config
    #[arg(long, default_value = "config/languages.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a local submission against a challenge file
    Grade {
        /// Challenge JSON file (one challenge or an array)
        #[arg(short = 'c', long)]
        challenge: PathBuf,

        /// Challenge id to grade against (defaults to the only challenge
        /// in the file)
        #[arg(long)]
        id: Option<String>,

        /// Submission source file
        #[arg(short, long)]
        source: PathBuf,

        /// Declared language (javascript, python, ...)
        #[arg(short, long)]
        language: String,

        /// Submitter identity for bookkeeping
        #[arg(short, long, default_value = "local")]
        user: String,

        /// Run every test case instead of stopping at the first failure
        #[arg(long, default_value = "false")]
        run_all: bool,

        /// Per-case wall-clock limit in milliseconds
        #[arg(long)]
        time_limit_ms: Option<u64>,

        /// Sandbox memory ceiling in megabytes
        #[arg(long)]
        memory_limit_mb: Option<u32>,
    },

    /// Verify a challenge's canonical solution passes its own test suite
    Verify {
        /// Challenge JSON file (one challenge or an array)
        #[arg(short = 'c', long)]
        challenge: PathBuf,

        /// Challenge id to verify (defaults to every challenge in the file)
        #[arg(long)]
        id: Option<String>,
    },

    /// List languages with a configured runtime profile
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            challenge,
            id,
            source,
            language,
            user,
            run_all,
            time_limit_ms,
            memory_limit_mb,
        } => {
            commands::grade(
                &cli.config,
                &challenge,
                id.as_deref(),
                &source,
                &language,
                &user,
                run_all,
                time_limit_ms,
                memory_limit_mb,
            )
            .await?;
        }
        Commands::Verify { challenge, id } => {
            commands::verify(&cli.config, &challenge, id.as_deref()).await?;
        }
        Commands::Languages => {
            commands::languages(&cli.config)?;
        }
    }

    Ok(())
}
