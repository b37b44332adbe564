//! testweave: learn UI test suites from CSV exports and page snapshots.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

use testweave::{
    DataPatternClassifier, MarkupSnapshotSource, TabularDataSource, UiPatternClassifier,
};
use testweave_cli::{
    learner_from_files, load_config, CsvTableSource, FileSnapshotSource, LearnRun,
};

#[derive(Parser)]
#[command(
    name = "testweave",
    about = "Learn UI test cases by matching exported data to the elements of a page",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the learning report.
    Learn {
        /// CSV export; repeat for several tables.
        #[arg(short, long)]
        data: Vec<PathBuf>,

        /// HTML snapshot of the page.
        #[arg(short, long, required_unless_present = "dom", conflicts_with = "dom")]
        markup: Option<PathBuf>,

        /// DOM-JSON snapshot of the page.
        #[arg(long)]
        dom: Option<PathBuf>,

        /// Keep at most this many test cases per connection type.
        #[arg(long)]
        max_per_type: Option<usize>,

        /// Write the report here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify CSV exports and print the field patterns.
    ClassifyData {
        /// CSV export; repeat for several tables.
        #[arg(short, long, required = true)]
        data: Vec<PathBuf>,
    },

    /// Classify a page snapshot and print the UI patterns.
    ClassifyUi {
        /// HTML snapshot of the page.
        #[arg(short, long, required_unless_present = "dom", conflicts_with = "dom")]
        markup: Option<PathBuf>,

        /// DOM-JSON snapshot of the page.
        #[arg(long)]
        dom: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   testweave completions bash > ~/.local/share/bash-completion/completions/testweave
    ///   testweave completions zsh > ~/.zfunc/_testweave
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Learn {
            data,
            markup,
            dom,
            max_per_type,
            output,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if max_per_type.is_some() {
                config.synthesis.max_per_type = max_per_type;
            }
            let snapshot = snapshot_path(markup, dom)?;

            let learner = learner_from_files(snapshot.clone(), &data, config);
            let mut ctx = learner.new_context();
            let report = learner.run(&mut ctx).await;
            tracing::info!(
                "Learned {} test cases in {} ms",
                report.test_cases.len(),
                ctx.elapsed().as_millis()
            );

            let run = LearnRun::new(snapshot, data, report);
            emit_json(&run, output.as_deref())?;
        }

        Commands::ClassifyData { data } => {
            let config = load_config(cli.config.as_deref())?;
            let records = CsvTableSource::new(data)
                .records()
                .await
                .context("failed to load CSV tables")?;
            let patterns = DataPatternClassifier::new(config.classifier).classify(&records);
            emit_json(&patterns, None)?;
        }

        Commands::ClassifyUi { markup, dom } => {
            let path = snapshot_path(markup, dom)?;
            let snapshot = FileSnapshotSource::new(&path)
                .snapshot()
                .await
                .with_context(|| format!("failed to read snapshot {}", path.display()))?;
            let patterns = UiPatternClassifier::new().classify(&snapshot);
            emit_json(&patterns, None)?;
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "testweave", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn snapshot_path(markup: Option<PathBuf>, dom: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    markup
        .or(dom)
        .context("either --markup or --dom is required")
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
