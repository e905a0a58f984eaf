//! Utility functions for string manipulation and file system checks.
//!
//! This module provides helper functions used throughout the pipeline:
//! - Slug generation and accent folding for identifiers and role matching
//! - Plain-text excerpts of HTML bodies for listings and meta descriptions
//! - String truncation for logging
//! - JSON error detection for handling truncated model responses
//! - File system validation for the output directory

use std::fs as stdfs;
use std::path::Path;

use scraper::Html;
use tokio::fs;
use tracing::{info, instrument};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{PipelineError, Result};

/// Lowercase `s` and strip diacritics (`"Pérez"` → `"perez"`).
fn strip_accents_lower(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Trimmed, lowercased, accent-free form used for case-insensitive matching.
pub fn fold_for_match(s: &str) -> String {
    strip_accents_lower(s.trim())
}

/// Convert a human-readable string to a URL-safe slug.
///
/// Diacritics are stripped, the result is lowercased, runs of whitespace or
/// hyphens become a single `-`, and every other non-alphanumeric character
/// is removed.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("José Pérez"), "jose-perez");
/// assert_eq!(slugify("¿Qué es la ciencia?"), "que-es-la-ciencia");
/// ```
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in strip_accents_lower(s).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    slug
}

/// Collapse an HTML fragment into whitespace-normalized plain text.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `text` to at most `max_chars` characters, appending `…` when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}…", text[..byte_idx].trim_end()),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of omitted bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}…(+{} bytes)", &s[..byte_idx], s.len() - byte_idx),
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the model response is cut off (e.g. due to token limits), the
/// resulting JSON fails with an EOF error rather than a syntax error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| PipelineError::write(path, e))?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(PipelineError::write(probe_path, e)),
    }
}
