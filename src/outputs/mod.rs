//! Output generation: HTML pages, indexes, JSON and the sitemap.
//!
//! Renderers are pure functions that return [`OutputFile`]s. Nothing touches
//! the disk until [`OutputBundle::commit`] writes the whole set at once.
//!
//! # Submodules
//!
//! - [`pages`]: per-record HTML pages and the shared document layout
//! - [`indexes`]: per-collection index pages grouped by year
//! - [`sections`]: fixed informational pages
//! - [`json`]: `articles.json`
//! - [`sitemap`]: `sitemap.xml` and `robots.txt`
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── articles.json
//! ├── articles/
//! │   ├── index.html
//! │   ├── index.EN.html
//! │   └── articulo12.html        # bilingual
//! ├── news/
//! │   ├── index.html / index.EN.html
//! │   └── <slug>.html / <slug>.EN.html
//! ├── team/
//! │   ├── index.html / index.EN.html
//! │   └── <slug>.html / <slug>.EN.html
//! ├── sections/
//! │   └── acerca.html / acerca.EN.html …
//! ├── sitemap.xml
//! └── robots.txt
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::{PipelineError, Result};

pub mod indexes;
pub mod json;
pub mod pages;
pub mod sections;
pub mod sitemap;

/// Site-wide values every page needs.
#[derive(Debug, Clone)]
pub struct Site {
    /// Ends with `/`.
    pub base_url: Url,
    pub journal_title: String,
}

impl Site {
    pub fn new(base_url: Url, journal_title: impl Into<String>) -> Self {
        Self {
            base_url,
            journal_title: journal_title.into(),
        }
    }

    /// Absolute URL of a path relative to the site root.
    pub fn url(&self, rel_path: &str) -> String {
        format!("{}{}", self.base_url.as_str(), rel_path.trim_start_matches('/'))
    }
}

/// Sitemap category of an emitted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Index,
    Section,
    Item,
}

impl PageKind {
    pub fn priority(&self) -> &'static str {
        match self {
            Self::Home => "1.0",
            Self::Index => "0.8",
            Self::Section => "0.6",
            Self::Item => "0.5",
        }
    }
}

/// Sitemap metadata of an HTML page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub kind: PageKind,
    /// Date of the underlying record, when it has a parseable one.
    pub lastmod: Option<NaiveDate>,
}

/// One file to emit, addressed relative to the output root with `/`
/// separators (which is also its URL path).
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: String,
    pub contents: String,
    /// `None` for files that are not listed in the sitemap.
    pub page: Option<PageMeta>,
}

impl OutputFile {
    pub fn page(
        path: impl Into<String>,
        contents: String,
        kind: PageKind,
        lastmod: Option<NaiveDate>,
    ) -> Self {
        Self {
            path: path.into(),
            contents,
            page: Some(PageMeta { kind, lastmod }),
        }
    }

    pub fn asset(path: impl Into<String>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
            page: None,
        }
    }

    fn target(&self, root: &Path) -> PathBuf {
        self.path.split('/').fold(root.to_path_buf(), |p, seg| p.join(seg))
    }
}

/// Ordered set of output files, unique by path.
#[derive(Debug, Default)]
pub struct OutputBundle {
    files: Vec<OutputFile>,
    positions: HashMap<String, usize>,
}

impl OutputBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. A file already queued at the same path is replaced.
    pub fn push(&mut self, file: OutputFile) {
        match self.positions.get(&file.path) {
            Some(&i) => {
                warn!(path = %file.path, "Two records render to the same path; keeping the later one");
                self.files[i] = file;
            }
            None => {
                self.positions.insert(file.path.clone(), self.files.len());
                self.files.push(file);
            }
        }
    }

    pub fn files(&self) -> &[OutputFile] {
        &self.files
    }

    /// Write every file under `root`; see [`commit_files`].
    pub async fn commit(&self, root: &Path) -> Result<usize> {
        commit_files(root, &self.files).await
    }
}

impl Extend<OutputFile> for OutputBundle {
    fn extend<I: IntoIterator<Item = OutputFile>>(&mut self, iter: I) {
        for file in iter {
            self.push(file);
        }
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.tmp"))
}

async fn remove_temps(temps: &[(PathBuf, PathBuf)]) {
    for (temp, _) in temps {
        let _ = fs::remove_file(temp).await;
    }
}

/// Write `files` under `root` in two phases.
///
/// Every file is first written to a hidden sibling temporary file. Only
/// when all of them exist are they renamed over their targets. If the first
/// phase fails, the temporaries are removed and existing output is left
/// untouched.
#[instrument(level = "info", skip_all, fields(root = %root.display(), files = files.len()))]
pub async fn commit_files(root: &Path, files: &[OutputFile]) -> Result<usize> {
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());

    for file in files {
        let target = file.target(root);
        let temp = temp_path(&target);

        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                error!(path = %parent.display(), error = %e, "Failed to create output directory");
                remove_temps(&staged).await;
                return Err(PipelineError::write(parent, e));
            }
        }
        if let Err(e) = fs::write(&temp, file.contents.as_bytes()).await {
            error!(path = %temp.display(), error = %e, "Failed to stage output file");
            let _ = fs::remove_file(&temp).await;
            remove_temps(&staged).await;
            return Err(PipelineError::write(target, e));
        }
        debug!(path = %file.path, bytes = file.contents.len(), "Staged output file");
        staged.push((temp, target));
    }

    for (i, (temp, target)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(temp, target).await {
            error!(path = %target.display(), error = %e, "Failed to move output file into place");
            remove_temps(&staged[i..]).await;
            return Err(PipelineError::write(target, e));
        }
    }

    info!(written = staged.len(), "Committed output files");
    Ok(staged.len())
}
