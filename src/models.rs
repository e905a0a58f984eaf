//! Data models for journal content and its bilingual representations.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`ArticleRecord`], [`NewsRecord`], [`TeamMemberRecord`]: normalized CSV rows
//! - [`BilingualText`]: the same content in Spanish and English
//! - [`EnrichedArticle`], [`EnrichedNews`], [`EnrichedMember`]: records with
//!   their translated fields merged back on
//!
//! Records are rebuilt from the spreadsheets on every run; nothing here is
//! persisted except through the emitted files.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::dates;
use crate::utils::{fold_for_match, slugify};

/// One of the three spreadsheet-backed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Articles,
    News,
    Team,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 3] = [Self::Articles, Self::News, Self::Team];

    /// Output directory (and URL prefix) of the collection.
    pub fn dir(&self) -> &'static str {
        match self {
            Self::Articles => "articles",
            Self::News => "news",
            Self::Team => "team",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

/// Target language of an emitted page.
///
/// Spanish is the primary language and produces unsuffixed files; English
/// pages carry the `.EN` suffix before the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Es,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Self::Es, Self::En];

    /// File name suffix inserted before `.html`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Es => "",
            Self::En => ".EN",
        }
    }

    /// Value of the `lang` / `hreflang` attributes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }

    pub fn other(&self) -> Language {
        match self {
            Self::Es => Self::En,
            Self::En => Self::Es,
        }
    }

    /// Pick the string matching this language.
    pub fn pick<'a>(&self, es: &'a str, en: &'a str) -> &'a str {
        match self {
            Self::Es => es,
            Self::En => en,
        }
    }
}

/// The same semantic content held in both site languages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    pub es: String,
    pub en: String,
}

impl BilingualText {
    pub fn new(es: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            es: es.into(),
            en: en.into(),
        }
    }

    /// Both slots filled with the original text (soft fallback).
    pub fn untranslated(text: &str) -> Self {
        Self::new(text, text)
    }

    pub fn get(&self, lang: Language) -> &str {
        lang.pick(&self.es, &self.en)
    }
}

/// A published article, as listed in the articles spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Sequential article number; unique within the journal.
    pub number: u32,
    pub title: String,
    /// Author names in the order given upstream.
    pub authors: Vec<String>,
    /// Abstract in the journal's native language.
    pub abstract_es: String,
    /// English abstract, when the spreadsheet carries one.
    pub abstract_en: Option<String>,
    pub keywords: Vec<String>,
    pub subject_area: String,
    /// ISO `YYYY-MM-DD` when the upstream value parsed, otherwise verbatim.
    pub date: String,
    pub volume: String,
    pub issue: String,
    /// Page range such as `12-20`.
    pub pages: String,
}

impl ArticleRecord {
    /// Name of the emitted HTML page, e.g. `articulo12.html`.
    pub fn page_name(&self) -> String {
        format!("articulo{}", self.number)
    }

    /// Relative URL of the article PDF.
    pub fn pdf_path(&self) -> String {
        format!("Articulos/Articulo{}.pdf", self.number)
    }

    /// First and last page of [`ArticleRecord::pages`], if it is a range.
    pub fn page_bounds(&self) -> Option<(&str, &str)> {
        let (first, last) = self.pages.split_once('-')?;
        let (first, last) = (first.trim(), last.trim());
        if first.is_empty() || last.is_empty() {
            return None;
        }
        Some((first, last))
    }
}

/// A news item. The body arrives Base64-encoded and is decoded during
/// normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub title: String,
    pub body_html: String,
    pub date: String,
}

impl NewsRecord {
    /// URL identity derived from title and date. Not guaranteed unique.
    ///
    /// A title with nothing sluggable becomes `noticia`, so the page never
    /// lands on a hidden `.html` file.
    pub fn slug(&self) -> String {
        let title = if slugify(&self.title).is_empty() {
            "noticia"
        } else {
            self.title.as_str()
        };
        slugify(&format!("{title} {}", self.date))
    }
}

/// A person listed in the team spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMemberRecord {
    pub name: String,
    pub roles: Vec<String>,
    pub description: String,
    pub interests: Vec<String>,
    pub image_url: Option<String>,
}

impl TeamMemberRecord {
    /// URL identity derived from the name. Not guaranteed unique.
    pub fn slug(&self) -> String {
        let slug = slugify(&self.name);
        if slug.is_empty() {
            "sin-nombre".to_string()
        } else {
            slug
        }
    }

    pub fn is_author(&self) -> bool {
        self.roles.iter().any(|r| is_author_role(r))
    }

    /// Holds at least one role other than author.
    pub fn is_staff(&self) -> bool {
        self.roles.iter().any(|r| !is_author_role(r))
    }

    pub fn in_view(&self, view: TeamView) -> bool {
        match view {
            TeamView::Team => self.is_staff(),
            TeamView::Authors => self.is_author(),
        }
    }
}

fn is_author_role(role: &str) -> bool {
    matches!(fold_for_match(role).as_str(), "autor" | "autora" | "author")
}

/// The two audiences the team spreadsheet is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamView {
    /// Editorial team: anyone with a non-author role.
    Team,
    /// Contributing authors.
    Authors,
}

/// Members visible in `view`, in spreadsheet order.
pub fn members_in_view<'a, M>(members: &'a [M], view: TeamView) -> Vec<&'a M>
where
    M: AsRef<TeamMemberRecord>,
{
    members
        .iter()
        .filter(|m| AsRef::<TeamMemberRecord>::as_ref(*m).in_view(view))
        .collect()
}

impl AsRef<TeamMemberRecord> for TeamMemberRecord {
    fn as_ref(&self) -> &TeamMemberRecord {
        self
    }
}

/// An article with its translated title and summary.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedArticle {
    pub record: ArticleRecord,
    pub title: BilingualText,
    pub summary: BilingualText,
}

impl EnrichedArticle {
    /// Build without translation; a missing English abstract falls back to
    /// the native one.
    pub fn passthrough(record: ArticleRecord) -> Self {
        let title = BilingualText::untranslated(&record.title);
        let summary = BilingualText::new(
            record.abstract_es.clone(),
            record
                .abstract_en
                .clone()
                .unwrap_or_else(|| record.abstract_es.clone()),
        );
        Self {
            record,
            title,
            summary,
        }
    }
}

/// A news item with translated title and body.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedNews {
    pub record: NewsRecord,
    pub title: BilingualText,
    pub body: BilingualText,
}

impl EnrichedNews {
    pub fn passthrough(record: NewsRecord) -> Self {
        let title = BilingualText::untranslated(&record.title);
        let body = BilingualText::untranslated(&record.body_html);
        Self {
            record,
            title,
            body,
        }
    }
}

/// A team member with translated description and interest areas.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedMember {
    pub record: TeamMemberRecord,
    pub description: BilingualText,
    /// Interest areas joined with `"; "`.
    pub interests: BilingualText,
}

impl EnrichedMember {
    pub fn passthrough(record: TeamMemberRecord) -> Self {
        let description = BilingualText::untranslated(&record.description);
        let interests = BilingualText::untranslated(&record.interests.join("; "));
        Self {
            record,
            description,
            interests,
        }
    }
}

impl AsRef<TeamMemberRecord> for EnrichedMember {
    fn as_ref(&self) -> &TeamMemberRecord {
        &self.record
    }
}

/// Anything an index page can bucket by year.
pub trait Dated {
    fn date(&self) -> &str;

    /// Publication year, if one can be recovered from the date field.
    fn year(&self) -> Option<i32> {
        dates::year_of(self.date())
    }
}

impl Dated for EnrichedArticle {
    fn date(&self) -> &str {
        &self.record.date
    }
}

impl Dated for EnrichedNews {
    fn date(&self) -> &str {
        &self.record.date
    }
}
