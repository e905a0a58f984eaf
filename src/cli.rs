//! Command-line interface definitions for the journal site generator.
//!
//! This module defines the settings using the `clap` crate. The job is meant
//! to run with no arguments: every setting is read from an environment
//! variable, and the flags only exist to override them on local runs.
//! Values are validated afterwards by [`crate::config::PipelineConfig`].

use std::path::PathBuf;

use clap::Parser;

/// Settings of one generation run.
///
/// # Examples
///
/// ```sh
/// # Usual scheduled run, everything from the environment
/// TRANSLATION_API_KEY=... ARTICLES_CSV_URL=... NEWS_CSV_URL=... TEAM_CSV_URL=... journal_sitegen
///
/// # Local preview into another directory
/// journal_sitegen --output-dir ./preview --translation-concurrency 1
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Key for the translation API (required)
    #[arg(long, env = "TRANSLATION_API_KEY", hide_env_values = true)]
    pub translation_api_key: Option<String>,

    /// Published CSV export of the articles sheet (required)
    #[arg(long, env = "ARTICLES_CSV_URL")]
    pub articles_csv_url: Option<String>,

    /// Published CSV export of the news sheet (required)
    #[arg(long, env = "NEWS_CSV_URL")]
    pub news_csv_url: Option<String>,

    /// Published CSV export of the team sheet (required)
    #[arg(long, env = "TEAM_CSV_URL")]
    pub team_csv_url: Option<String>,

    /// Public base URL of the site, used for canonical links and the sitemap
    #[arg(long, env = "SITE_BASE_URL", default_value = "https://revista.example.org/")]
    pub site_base_url: String,

    /// Root directory of the generated site
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "public")]
    pub output_dir: PathBuf,

    /// Journal name shown in page headers and citation metadata
    #[arg(long, env = "JOURNAL_TITLE", default_value = "Revista Estudiantil de Ciencias")]
    pub journal_title: String,

    /// OpenAI-compatible chat-completions endpoint
    #[arg(
        long,
        env = "TRANSLATION_API_URL",
        default_value = "https://api.openai.com/v1/chat/completions"
    )]
    pub translation_api_url: String,

    /// Model name sent with every translation request
    #[arg(long, env = "TRANSLATION_MODEL", default_value = "gpt-4o-mini")]
    pub translation_model: String,

    /// Records translated concurrently
    #[arg(long, env = "TRANSLATION_CONCURRENCY", default_value_t = 4)]
    pub translation_concurrency: usize,

    /// Timeout of one translation call, in seconds
    #[arg(long, env = "TRANSLATION_TIMEOUT_SECS", default_value_t = 60)]
    pub translation_timeout_secs: u64,

    /// Retries of a failed translation call (at most 2)
    #[arg(long, env = "TRANSLATION_MAX_RETRIES", default_value_t = 2)]
    pub translation_max_retries: usize,

    /// Timeout of one CSV download, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Retries of a failed CSV download (at most 2)
    #[arg(long, env = "FETCH_MAX_RETRIES", default_value_t = 2)]
    pub fetch_max_retries: usize,

    /// Date used as sitemap `lastmod` for undated pages (YYYY-MM-DD, default today)
    #[arg(long, env = "BUILD_DATE")]
    pub build_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "journal_sitegen",
            "--translation-api-key",
            "k",
            "--output-dir",
            "/tmp/site",
            "--translation-concurrency",
            "8",
        ]);

        assert_eq!(cli.translation_api_key.as_deref(), Some("k"));
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/site"));
        assert_eq!(cli.translation_concurrency, 8);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["journal_sitegen", "-o", "./preview"]);
        assert_eq!(cli.output_dir, PathBuf::from("./preview"));
    }

    #[test]
    fn test_cli_rejects_non_numeric_limits() {
        let result = Cli::try_parse_from(["journal_sitegen", "--fetch-timeout-secs", "soon"]);
        assert!(result.is_err());
    }
}
