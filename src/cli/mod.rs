//! CLI commands implementation.
//!
//! Parses arguments and dispatches to the pipeline stages. The browser
//! session is created here, scoped to one command, and closed on every
//! exit path.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "coursh")]
#[command(about = "Course document harvesting and acquisition pipeline")]
#[command(version)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run the browser with a visible window
    #[arg(long, global = true)]
    headed: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest search metadata and write the ranked CSV
    Harvest {
        /// Search term, e.g. "cours de java"
        query: String,

        /// Number of search result pages to harvest
        #[arg(short, long, default_value_t = 5)]
        pages: u32,
    },

    /// Acquire the files for a previously harvested CSV
    Acquire {
        /// Search term the CSV was harvested for
        query: String,
    },

    /// Full pipeline: harvest, rank, export, then acquire
    Run {
        /// Search term, e.g. "cours de java"
        query: String,

        /// Number of search result pages to harvest
        #[arg(short, long, default_value_t = 5)]
        pages: u32,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.headed {
        settings.browser.headless = false;
    }

    match cli.command {
        Commands::Harvest { query, pages } => commands::harvest(&settings, &query, pages).await,
        Commands::Acquire { query } => commands::acquire(&settings, &query).await,
        Commands::Run { query, pages } => {
            commands::harvest(&settings, &query, pages).await?;
            // The export file is re-read from disk on purpose: the CSV is
            // the contract between the two halves of the pipeline.
            commands::acquire(&settings, &query).await
        }
    }
}

#[cfg(feature = "browser")]
mod commands {
    use indicatif::{ProgressBar, ProgressStyle};
    use tracing::info;

    use crate::acquire::AcquisitionOrchestrator;
    use crate::browser::ChromeSession;
    use crate::config::Settings;
    use crate::export;
    use crate::harvest::MetadataHarvester;
    use crate::rank::Ranker;
    use crate::storage::{DocumentSink, JsonlSink};

    pub async fn harvest(settings: &Settings, query: &str, pages: u32) -> anyhow::Result<()> {
        anyhow::ensure!(pages >= 1, "page count must be at least 1");

        let download_dir = settings.download_dir(query);
        std::fs::create_dir_all(&download_dir)?;

        let session = ChromeSession::launch(&settings.browser, &download_dir).await?;
        let candidates = MetadataHarvester::new(&session, &settings.search)
            .harvest(query, pages)
            .await;
        session.close().await;

        let harvested = candidates.len();
        let ranked = Ranker::new(&settings.rank).rank(candidates);
        let path = settings.export_path(query);
        export::write_records(&path, &ranked)?;

        info!("Harvested {} candidates across {} pages", harvested, pages);
        println!(
            "Extracted {} documents, saved top {} to {}",
            harvested,
            ranked.len(),
            path.display()
        );
        Ok(())
    }

    pub async fn acquire(settings: &Settings, query: &str) -> anyhow::Result<()> {
        let path = settings.export_path(query);
        let records = export::read_records(&path)?;
        println!("Found {} links to process.", records.len());

        let download_dir = settings.download_dir(query);
        std::fs::create_dir_all(&download_dir)?;

        let bar = ProgressBar::new(records.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        bar.set_message("Acquiring");

        let session = ChromeSession::launch(&settings.browser, &download_dir).await?;
        let report = AcquisitionOrchestrator::new(
            &session,
            &settings.acquire,
            &settings.download_root,
            &download_dir,
        )
        .acquire_all(&records, || bar.inc(1))
        .await;
        session.close().await;
        bar.finish_and_clear();

        let sink = JsonlSink::new(&download_dir.join("documents.jsonl"));
        for document in &report.completed {
            sink.insert(document).await?;
        }

        println!(
            "Acquired {}/{} documents ({} timed out, {} failed); records in {}",
            report.completed.len(),
            report.attempted(),
            report.timed_out,
            report.failed,
            sink.path().display()
        );
        Ok(())
    }
}

#[cfg(not(feature = "browser"))]
mod commands {
    use crate::config::Settings;
    use crate::error::BrowserError;

    fn not_compiled() -> BrowserError {
        BrowserError::Unavailable(
            "not compiled in; rebuild with: cargo build --features browser".to_string(),
        )
    }

    pub async fn harvest(_: &Settings, _: &str, _: u32) -> anyhow::Result<()> {
        Err(not_compiled().into())
    }

    pub async fn acquire(_: &Settings, _: &str) -> anyhow::Result<()> {
        Err(not_compiled().into())
    }
}
