//! Error types for the site generation pipeline.
//!
//! Each variant maps to one failure class of the run:
//! - [`PipelineError::Config`]: invalid settings, fatal before anything starts
//! - [`PipelineError::Fetch`]: one resource class could not be downloaded
//! - [`PipelineError::Parse`]: a CSV payload could not be read
//! - [`PipelineError::Translation`]: the translation collaborator failed
//! - [`PipelineError::Write`]: the output tree could not be written, fatal

use std::path::PathBuf;

use crate::models::ResourceClass;

/// Top-level error type for all pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while downloading a CSV export.
    #[error("fetch failed for {class}: {reason}{}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Fetch {
        class: ResourceClass,
        status: Option<u16>,
        reason: String,
    },

    /// Malformed CSV payload.
    #[error("parse error in {class}: {message}")]
    Parse {
        class: ResourceClass,
        message: String,
    },

    /// Translation provider error, timeout or malformed output.
    #[error("translation error: {0}")]
    Translation(String),

    /// Filesystem error while writing output.
    #[error("write error at {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn fetch(class: ResourceClass, status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            class,
            status,
            reason: reason.into(),
        }
    }

    pub fn parse(class: ResourceClass, msg: impl Into<String>) -> Self {
        Self::Parse {
            class,
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with the path being written.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
