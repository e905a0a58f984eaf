//! Articles sheet normalization.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use super::schema::{ARTICLES, ArticleField};
use super::{dates, parse_table, split_multi, split_unique};
use crate::error::Result;
use crate::models::{ArticleRecord, ResourceClass};

/// Parse the articles CSV into records, in sheet order.
///
/// Rows without a title or a numeric article number are dropped. When two
/// rows share a number, the first one wins.
#[instrument(level = "info", skip_all, fields(bytes = input.as_ref().len()))]
pub fn parse_articles(input: impl AsRef<[u8]>) -> Result<Vec<ArticleRecord>> {
    let rows = parse_table(ResourceClass::Articles, input)?;
    let total = rows.len();
    let mut seen = HashSet::new();
    let mut articles = Vec::with_capacity(total);

    for (i, row) in rows.iter().enumerate() {
        let field = |f| ARTICLES.value(row, f);

        let (Some(title), Some(number)) = (field(ArticleField::Title), field(ArticleField::Number))
        else {
            debug!(row = i + 2, "Skipping article row without title or number");
            continue;
        };
        let Ok(number) = number.parse::<u32>() else {
            warn!(row = i + 2, number, "Skipping article row with non-numeric number");
            continue;
        };
        if !seen.insert(number) {
            warn!(row = i + 2, number, "Duplicate article number; keeping the first row");
            continue;
        }

        articles.push(ArticleRecord {
            number,
            title: title.to_string(),
            authors: split_multi(field(ArticleField::Authors).unwrap_or_default()),
            abstract_es: field(ArticleField::AbstractEs).unwrap_or_default().to_string(),
            abstract_en: field(ArticleField::AbstractEn).map(str::to_string),
            keywords: split_unique(field(ArticleField::Keywords).unwrap_or_default()),
            subject_area: field(ArticleField::SubjectArea).unwrap_or_default().to_string(),
            date: dates::normalize_date(field(ArticleField::Date).unwrap_or_default()),
            volume: field(ArticleField::Volume).unwrap_or_default().to_string(),
            issue: field(ArticleField::Issue).unwrap_or_default().to_string(),
            pages: field(ArticleField::Pages).unwrap_or_default().to_string(),
        });
    }

    info!(rows = total, kept = articles.len(), "Normalized articles");
    Ok(articles)
}
