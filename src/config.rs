//! Validated run configuration.
//!
//! [`PipelineConfig::from_cli`] turns the raw [`Cli`] settings into typed
//! values and rejects anything unusable before a single request is made.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use url::Url;

use crate::cli::Cli;
use crate::error::{PipelineError, Result};
use crate::retry::RetryPolicy;
use crate::sources::SourceSet;

/// Upper bound on retries for fetches and translation calls.
pub const MAX_RETRIES: usize = 2;

const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Everything a run needs, checked once at startup.
#[derive(Clone)]
pub struct PipelineConfig {
    pub api_key: String,
    pub sources: SourceSet,
    /// Site root; always ends with `/`.
    pub base_url: Url,
    pub output_dir: PathBuf,
    pub journal_title: String,
    pub translation_api_url: Url,
    pub translation_model: String,
    pub translation_concurrency: usize,
    pub translation_timeout: Duration,
    pub translation_retry: RetryPolicy,
    pub fetch_timeout: Duration,
    pub fetch_retry: RetryPolicy,
    /// `lastmod` of pages without a date of their own.
    pub build_date: NaiveDate,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("api_key", &"<redacted>")
            .field("sources", &self.sources)
            .field("base_url", &self.base_url.as_str())
            .field("output_dir", &self.output_dir)
            .field("journal_title", &self.journal_title)
            .field("translation_api_url", &self.translation_api_url.as_str())
            .field("translation_model", &self.translation_model)
            .field("translation_concurrency", &self.translation_concurrency)
            .field("translation_timeout", &self.translation_timeout)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("build_date", &self.build_date)
            .finish()
    }
}

fn required<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PipelineError::config(format!("{var} is not set"))),
    }
}

fn parse_url(value: &str, var: &str) -> Result<Url> {
    let url = Url::parse(value.trim())
        .map_err(|e| PipelineError::config(format!("{var} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PipelineError::config(format!(
            "{var} must be an http(s) URL, got scheme {other:?}"
        ))),
    }
}

fn retries(value: usize, var: &str) -> Result<RetryPolicy> {
    if value > MAX_RETRIES {
        return Err(PipelineError::config(format!(
            "{var} must be at most {MAX_RETRIES}, got {value}"
        )));
    }
    if value == 0 {
        return Ok(RetryPolicy::none());
    }
    Ok(RetryPolicy::new(value, RETRY_BASE_DELAY))
}

fn timeout(secs: u64, var: &str) -> Result<Duration> {
    if secs == 0 {
        return Err(PipelineError::config(format!("{var} must be positive")));
    }
    Ok(Duration::from_secs(secs))
}

impl PipelineConfig {
    /// Validate the raw settings. Any error here is fatal for the run.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let api_key = required(&cli.translation_api_key, "TRANSLATION_API_KEY")?.to_string();

        let sources = SourceSet {
            articles: parse_url(
                required(&cli.articles_csv_url, "ARTICLES_CSV_URL")?,
                "ARTICLES_CSV_URL",
            )?,
            news: parse_url(required(&cli.news_csv_url, "NEWS_CSV_URL")?, "NEWS_CSV_URL")?,
            team: parse_url(required(&cli.team_csv_url, "TEAM_CSV_URL")?, "TEAM_CSV_URL")?,
        };

        let mut base_url = parse_url(&cli.site_base_url, "SITE_BASE_URL")?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        if cli.translation_concurrency == 0 {
            return Err(PipelineError::config(
                "TRANSLATION_CONCURRENCY must be at least 1",
            ));
        }

        let journal_title = cli.journal_title.trim().to_string();
        if journal_title.is_empty() {
            return Err(PipelineError::config("JOURNAL_TITLE must not be blank"));
        }

        let build_date = match cli.build_date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                PipelineError::config(format!("BUILD_DATE must be YYYY-MM-DD, got {s:?}: {e}"))
            })?,
            _ => Local::now().date_naive(),
        };

        Ok(Self {
            api_key,
            sources,
            base_url,
            output_dir: cli.output_dir.clone(),
            journal_title,
            translation_api_url: parse_url(&cli.translation_api_url, "TRANSLATION_API_URL")?,
            translation_model: cli.translation_model.trim().to_string(),
            translation_concurrency: cli.translation_concurrency,
            translation_timeout: timeout(cli.translation_timeout_secs, "TRANSLATION_TIMEOUT_SECS")?,
            translation_retry: retries(cli.translation_max_retries, "TRANSLATION_MAX_RETRIES")?,
            fetch_timeout: timeout(cli.fetch_timeout_secs, "FETCH_TIMEOUT_SECS")?,
            fetch_retry: retries(cli.fetch_max_retries, "FETCH_MAX_RETRIES")?,
            build_date,
        })
    }
}
