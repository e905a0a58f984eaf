//! Bilingual enrichment of normalized records.
//!
//! Every translatable field goes through [`Enricher::translate`], which asks
//! the model for a `{"es": ..., "en": ...}` pair. Translation is best effort:
//! a failed call, a non-conforming reply or blank input leaves the original
//! text in both language slots and the record is still published.
//!
//! Records are processed concurrently (bounded by the configured
//! concurrency) but come back in input order, so emitted indexes do not
//! depend on response timing.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::AskAsync;
use crate::models::{
    ArticleRecord, BilingualText, EnrichedArticle, EnrichedMember, EnrichedNews, NewsRecord,
    TeamMemberRecord,
};
use crate::utils::{looks_truncated, truncate_for_log};

#[derive(Debug, Deserialize)]
struct TranslationPair {
    es: String,
    en: String,
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````), if any.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_pair(reply: &str) -> serde_json::Result<TranslationPair> {
    serde_json::from_str(strip_code_fence(reply))
}

/// Translates records through an [`AskAsync`] model and counts fallbacks.
#[derive(Debug)]
pub struct Enricher<A> {
    ask: A,
    concurrency: usize,
    requests: AtomicUsize,
    fallbacks: AtomicUsize,
}

impl<A> Enricher<A>
where
    A: AskAsync<Response = String>,
{
    /// `concurrency` is clamped to at least one in-flight record.
    pub fn new(ask: A, concurrency: usize) -> Self {
        Self {
            ask,
            concurrency: concurrency.max(1),
            requests: AtomicUsize::new(0),
            fallbacks: AtomicUsize::new(0),
        }
    }

    /// Model calls issued so far, re-asks included.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Fields that kept their original text because translation failed.
    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    async fn ask_model(&self, text: &str) -> crate::error::Result<String> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.ask.ask(text).await
    }

    fn fallback(&self, text: &str) -> BilingualText {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        BilingualText::untranslated(text)
    }

    /// Produce both language versions of `text`. Never fails.
    ///
    /// Blank input is returned as-is without calling the model. A reply that
    /// was cut off mid-JSON is re-asked once. An empty slot in the reply is
    /// filled with the original text.
    pub async fn translate(&self, text: &str) -> BilingualText {
        if text.trim().is_empty() {
            return BilingualText::untranslated(text);
        }

        let reply = match self.ask_model(text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Translation failed; keeping original text");
                return self.fallback(text);
            }
        };

        let mut parsed = parse_pair(&reply);
        let mut last_reply = reply;

        if let Err(ref e) = parsed {
            if looks_truncated(e) {
                warn!(error = %e, "EOF while parsing translation; re-asking once");
                match self.ask_model(text).await {
                    Ok(r2) => {
                        parsed = parse_pair(&r2);
                        last_reply = r2;
                    }
                    Err(e2) => {
                        warn!(error = %e2, "Re-ask failed; keeping original text");
                        return self.fallback(text);
                    }
                }
            }
        }

        match parsed {
            Ok(pair) => {
                let pick = |s: String| if s.trim().is_empty() { text.to_string() } else { s };
                BilingualText::new(pick(pair.es), pick(pair.en))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&last_reply, 300),
                    "Model returned non-conforming JSON; keeping original text"
                );
                self.fallback(text)
            }
        }
    }

    async fn enrich_article(&self, record: ArticleRecord) -> EnrichedArticle {
        let base = EnrichedArticle::passthrough(record);
        let summary = async {
            match &base.record.abstract_en {
                Some(_) => base.summary.clone(),
                None => {
                    let pair = self.translate(&base.summary.es).await;
                    BilingualText::new(base.summary.es.clone(), pair.en)
                }
            }
        };
        let (title, summary) = futures::join!(self.translate(&base.record.title), summary);
        debug!(number = base.record.number, "Enriched article");
        EnrichedArticle {
            title,
            summary,
            ..base
        }
    }

    async fn enrich_news_item(&self, record: NewsRecord) -> EnrichedNews {
        let base = EnrichedNews::passthrough(record);
        let (title, body) = futures::join!(
            self.translate(&base.title.es),
            self.translate(&base.body.es)
        );
        EnrichedNews { title, body, ..base }
    }

    async fn enrich_member(&self, record: TeamMemberRecord) -> EnrichedMember {
        let base = EnrichedMember::passthrough(record);
        let (description, interests) = futures::join!(
            self.translate(&base.description.es),
            self.translate(&base.interests.es)
        );
        EnrichedMember {
            description,
            interests,
            ..base
        }
    }

    /// Translate article titles, and abstracts that lack an English version.
    #[instrument(level = "info", skip_all, fields(count = records.len()))]
    pub async fn enrich_articles(&self, records: Vec<ArticleRecord>) -> Vec<EnrichedArticle> {
        let before = self.fallbacks();
        let out: Vec<EnrichedArticle> = stream::iter(records)
            .map(|r| self.enrich_article(r))
            .buffered(self.concurrency)
            .collect()
            .await;
        info!(
            requests = self.requests(),
            fallbacks = self.fallbacks() - before,
            "Enriched articles"
        );
        out
    }

    /// Translate news titles and HTML bodies.
    #[instrument(level = "info", skip_all, fields(count = records.len()))]
    pub async fn enrich_news(&self, records: Vec<NewsRecord>) -> Vec<EnrichedNews> {
        let before = self.fallbacks();
        let out: Vec<EnrichedNews> = stream::iter(records)
            .map(|r| self.enrich_news_item(r))
            .buffered(self.concurrency)
            .collect()
            .await;
        info!(
            requests = self.requests(),
            fallbacks = self.fallbacks() - before,
            "Enriched news"
        );
        out
    }

    /// Translate member descriptions and interest areas. Roles are labelled
    /// at render time from a fixed glossary instead.
    #[instrument(level = "info", skip_all, fields(count = records.len()))]
    pub async fn enrich_team(&self, records: Vec<TeamMemberRecord>) -> Vec<EnrichedMember> {
        let before = self.fallbacks();
        let out: Vec<EnrichedMember> = stream::iter(records)
            .map(|r| self.enrich_member(r))
            .buffered(self.concurrency)
            .collect()
            .await;
        info!(
            requests = self.requests(),
            fallbacks = self.fallbacks() - before,
            "Enriched team"
        );
        out
    }
}
