//! adaptest CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Adaptive difficulty assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single assessment session
    Run(commands::run::RunArgs),

    /// Run a simulated session for every student in a cohort
    Cohort {
        /// Path to a cohort .toml file or a directory of them
        #[arg(long)]
        cohort: PathBuf,

        /// Ability provider name from the config (default: config's default_provider)
        #[arg(long)]
        provider: Option<String>,

        /// Max concurrent ability estimates
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate cohort TOML files
    Validate {
        /// Path to cohort file or directory
        #[arg(long)]
        cohort: PathBuf,
    },

    /// Render a saved session report as DOT and/or HTML
    Render {
        /// Session report JSON
        #[arg(long)]
        report: PathBuf,

        /// Output format: dot, html, all
        #[arg(long, default_value = "all")]
        format: String,

        /// Output directory (default: next to the report)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create starter config and example cohort
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptest=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Cohort {
            cohort,
            provider,
            parallelism,
            output,
            format,
            config,
        } => commands::cohort::execute(cohort, provider, parallelism, output, format, config).await,
        Commands::Validate { cohort } => commands::validate::execute(cohort),
        Commands::Render {
            report,
            format,
            output,
        } => commands::render::execute(report, format, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
