//! Content sources: the published spreadsheet CSV exports.
//!
//! Each [`ResourceClass`] is backed by one published-to-web CSV URL. The
//! classes are fetched independently, so a failing sheet only takes its own
//! collection down.
//!
//! | Class | Env var | Sheet |
//! |-------|---------|-------|
//! | Articles | `ARTICLES_CSV_URL` | one row per published article |
//! | News | `NEWS_CSV_URL` | one row per news item, Base64 body |
//! | Team | `TEAM_CSV_URL` | one row per person, `;`-separated roles |

use url::Url;

use crate::models::ResourceClass;

pub mod sheets;

pub use sheets::{build_client, fetch_csv};

/// The CSV export URL of every resource class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    pub articles: Url,
    pub news: Url,
    pub team: Url,
}

impl SourceSet {
    pub fn url_for(&self, class: ResourceClass) -> &Url {
        match class {
            ResourceClass::Articles => &self.articles,
            ResourceClass::News => &self.news,
            ResourceClass::Team => &self.team,
        }
    }
}
