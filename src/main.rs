//! # Journal Sitegen
//!
//! Builds the public website of a bilingual (Spanish/English) student
//! science journal from three published spreadsheets: articles, news and
//! team. Every run regenerates static HTML pages, collection indexes, an
//! article catalogue in JSON, a sitemap and `robots.txt`.
//!
//! ## Features
//!
//! - Downloads the CSV exports of the three sheets with timeouts and retries
//! - Normalizes rows through explicit column tables (dates, Base64 news
//!   bodies, multi-valued cells)
//! - Translates titles, abstracts, news bodies and profiles through an
//!   OpenAI-compatible chat API, falling back to the original text
//! - Emits Spanish and English pages with canonical, `hreflang` and
//!   Google Scholar citation metadata
//!
//! ## Usage
//!
//! ```sh
//! TRANSLATION_API_KEY=... \
//! ARTICLES_CSV_URL=... NEWS_CSV_URL=... TEAM_CSV_URL=... \
//! journal_sitegen
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: download each sheet's CSV export
//! 2. **Normalizing**: turn rows into typed records
//! 3. **Enriching**: translate records (4 at a time per sheet by default)
//! 4. **Output**: commit pages and indexes, then the sitemap
//!
//! The three sheets are processed concurrently; a sheet that fails leaves
//! its previous pages in place and makes the process exit non-zero.

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod enrich;
mod error;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod retry;
mod sources;
mod utils;

use api::{ChatTranslator, RetryAsk};
use cli::Cli;
use config::PipelineConfig;
use models::ResourceClass;
use pipeline::Pipeline;
use sources::build_client;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("journal_sitegen starting up");

    let args = Cli::parse();
    let config = match PipelineConfig::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration; nothing was fetched or written");
            return Err(e.into());
        }
    };
    debug!(?config, "Loaded configuration");

    // Early check: fail before any network traffic if output can't be written
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let client = build_client(config.fetch_timeout)?;
    let translator = RetryAsk::new(
        ChatTranslator::with_timeout(
            config.translation_timeout,
            config.translation_api_url.as_str(),
            config.api_key.as_str(),
            config.translation_model.as_str(),
        )?,
        config.translation_retry,
    );
    info!(
        model = %config.translation_model,
        concurrency = config.translation_concurrency,
        "Translator ready"
    );

    let report = Pipeline::new(config, client, translator).run().await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        files = report.files_written,
        "Execution complete"
    );

    if report.any_class_failed() {
        let failed: Vec<String> = ResourceClass::ALL
            .into_iter()
            .filter(|class| report.outcome(*class).is_some_and(|o| o.failed()))
            .map(|class| class.to_string())
            .collect();
        error!(?failed, "Some resource classes could not be published");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
