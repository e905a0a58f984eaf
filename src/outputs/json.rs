//! JSON output of the article catalogue.
//!
//! `articles.json` at the output root lists every normalized article record
//! in sheet order, for consumers that want the catalogue without scraping
//! the HTML.

use serde::Serialize;
use tracing::{info, instrument};

use super::OutputFile;
use crate::error::{PipelineError, Result};
use crate::models::ArticleRecord;

pub const ARTICLES_JSON: &str = "articles.json";

#[derive(Serialize)]
struct Catalogue<'a> {
    journal: &'a str,
    count: usize,
    articles: &'a [ArticleRecord],
}

/// Serialize `articles` into the `articles.json` output file.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub fn render_articles_json(
    journal_title: &str,
    articles: &[ArticleRecord],
) -> Result<OutputFile> {
    let catalogue = Catalogue {
        journal: journal_title,
        count: articles.len(),
        articles,
    };
    let mut json = serde_json::to_string_pretty(&catalogue)
        .map_err(|e| PipelineError::write(ARTICLES_JSON, e.into()))?;
    json.push('\n');
    info!(bytes = json.len(), "Rendered articles catalogue");
    Ok(OutputFile::asset(ARTICLES_JSON, json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_lists_every_record() {
        let record = ArticleRecord {
            number: 3,
            title: "Fotosíntesis".into(),
            authors: vec!["Ana Ruiz".into()],
            abstract_es: "Resumen".into(),
            abstract_en: None,
            keywords: vec!["plantas".into()],
            subject_area: "Biología".into(),
            date: "2024-03-15".into(),
            volume: "1".into(),
            issue: "2".into(),
            pages: "1-9".into(),
        };
        let file = render_articles_json("Revista", &[record.clone()]).unwrap();
        assert_eq!(file.path, "articles.json");
        assert_eq!(file.page, None);

        let value: serde_json::Value = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["articles"][0]["number"], 3);
        assert_eq!(value["articles"][0]["abstract_en"], serde_json::Value::Null);

        let back: Vec<ArticleRecord> = serde_json::from_value(value["articles"].clone()).unwrap();
        assert_eq!(back, vec![record]);
    }
}
