mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scrub")]
#[command(version, about = "Plugin-based data cleaning pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Root directory holding per-cleaner rule documents
    #[arg(long, global = true, default_value = "cleaners")]
    root: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cleaners: acquire, transform, validate, persist
    Run {
        /// Cleaners to run, in order
        names: Vec<String>,

        /// Run every registered cleaner
        #[arg(long)]
        all: bool,

        /// Validate only, never persist output
        #[arg(long)]
        test: bool,

        /// Prefer path-based acquisition where a cleaner supports it
        #[arg(long)]
        disk: bool,

        /// Run up to N cleaners concurrently (default 4 when given bare)
        #[arg(short, long, value_name = "N", num_args = 0..=1, default_missing_value = "4")]
        parallel: Option<usize>,

        /// Per-cleaner timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,

        /// Directory for persisted cleaned output
        #[arg(short, long, default_value = "cleaned")]
        output_dir: String,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List registered cleaners and whether each can run
    List {
        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show metadata, capabilities, and rules for one cleaner
    Info {
        /// Cleaner name
        name: String,
    },

    /// List the rule types available in rule documents
    Rules,

    /// Install missing dependencies for a cleaner
    Install {
        /// Cleaner name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            names,
            all,
            test,
            disk,
            parallel,
            timeout,
            output_dir,
            format,
        } => {
            let options = commands::run::Options {
                all,
                test,
                disk,
                parallel,
                timeout,
                output_dir,
                format,
            };
            commands::run::execute(&cli.root, names, options).await
        }

        Commands::List { format } => commands::list::execute(&cli.root, &format),

        Commands::Info { name } => commands::info::execute(&cli.root, &name),

        Commands::Rules => commands::rules::execute(),

        Commands::Install { name } => commands::install::execute(&cli.root, &name),
    }
}
