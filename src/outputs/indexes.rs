//! Collection index pages.
//!
//! Each collection gets one index per language (`index.html`,
//! `index.EN.html`):
//!
//! - **Articles** and **news** are grouped by publication year, newest year
//!   first, undated entries last; entries keep their sheet order within a
//!   year.
//! - **Team** lists the editorial team and the contributing authors as two
//!   separate sections. A person holding both kinds of role appears in both.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use tracing::{debug, instrument};

use super::pages::{Document, esc, index_path, labels, language_alternates, layout, role_label};
use super::{OutputFile, PageKind, Site};
use crate::models::{
    Dated, EnrichedArticle, EnrichedMember, EnrichedNews, Language, ResourceClass, TeamView,
    members_in_view,
};
use crate::utils::{excerpt, html_to_text};

const EXCERPT_CHARS: usize = 200;

/// Bucket `items` by year: years descending, undated (`None`) last, input
/// order kept inside each bucket.
pub fn group_by_year<T: Dated>(items: &[T]) -> Vec<(Option<i32>, Vec<&T>)> {
    let mut dated: BTreeMap<Reverse<i32>, Vec<&T>> = BTreeMap::new();
    let mut undated: Vec<&T> = Vec::new();

    for item in items {
        match item.year() {
            Some(year) => dated.entry(Reverse(year)).or_default().push(item),
            None => undated.push(item),
        }
    }

    let mut groups: Vec<(Option<i32>, Vec<&T>)> = dated
        .into_iter()
        .map(|(Reverse(year), items)| (Some(year), items))
        .collect();
    if !undated.is_empty() {
        groups.push((None, undated));
    }
    groups
}

fn year_sections<T: Dated>(
    items: &[T],
    lang: Language,
    entry: impl Fn(&T) -> String,
) -> String {
    let l = labels(lang);
    let groups = group_by_year(items);
    if groups.is_empty() {
        return format!("<p class=\"empty\">{}</p>\n", l.no_entries);
    }

    let mut out = String::new();
    for (year, entries) in groups {
        let heading = year.map_or_else(|| l.undated.to_string(), |y| y.to_string());
        out.push_str(&format!(
            "<section class=\"year\">\n<h2>{heading}</h2>\n<ul>\n"
        ));
        for item in entries {
            out.push_str(&entry(item));
        }
        out.push_str("</ul>\n</section>\n");
    }
    out
}

fn index_page(
    site: &Site,
    class: ResourceClass,
    lang: Language,
    title: &str,
    list: String,
) -> OutputFile {
    let path = index_path(class, lang);
    let body = format!("<h1>{}</h1>\n{list}", esc(title));
    let html = layout(
        site,
        &Document {
            lang,
            title,
            description: title,
            canonical: site.url(&path),
            alternates: language_alternates(site, |lang| index_path(class, lang)),
            head: String::new(),
            body,
        },
    );
    OutputFile::page(path, html, PageKind::Index, None)
}

/// Article index. Every entry links to the single bilingual article page.
#[instrument(level = "debug", skip_all, fields(count = articles.len(), lang = lang.code()))]
pub fn render_articles_index(
    site: &Site,
    articles: &[EnrichedArticle],
    lang: Language,
) -> OutputFile {
    let list = year_sections(articles, lang, |a| {
        let record = &a.record;
        let mut li = format!(
            "<li class=\"article-entry\">\n<a href=\"{}.html\">{}</a>\n",
            record.page_name(),
            esc(a.title.get(lang))
        );
        if !record.authors.is_empty() {
            li.push_str(&format!(
                "<p class=\"authors\">{}</p>\n",
                esc(&record.authors.join(", "))
            ));
        }
        let summary = a.summary.get(lang);
        if !summary.trim().is_empty() {
            li.push_str(&format!(
                "<p class=\"excerpt\">{}</p>\n",
                esc(&excerpt(summary, EXCERPT_CHARS))
            ));
        }
        li.push_str("</li>\n");
        li
    });
    debug!("Rendered articles index");
    index_page(site, ResourceClass::Articles, lang, labels(lang).articles, list)
}

/// News index, newest year first.
#[instrument(level = "debug", skip_all, fields(count = news.len(), lang = lang.code()))]
pub fn render_news_index(site: &Site, news: &[EnrichedNews], lang: Language) -> OutputFile {
    let list = year_sections(news, lang, |n| {
        let record = &n.record;
        let mut li = format!(
            "<li class=\"news-entry\">\n<a href=\"{}{}.html\">{}</a>\n",
            record.slug(),
            lang.suffix(),
            esc(n.title.get(lang))
        );
        if !record.date.is_empty() {
            li.push_str(&format!(
                "<time datetime=\"{0}\">{0}</time>\n",
                esc(&record.date)
            ));
        }
        let text = html_to_text(n.body.get(lang));
        if !text.is_empty() {
            li.push_str(&format!(
                "<p class=\"excerpt\">{}</p>\n",
                esc(&excerpt(&text, EXCERPT_CHARS))
            ));
        }
        li.push_str("</li>\n");
        li
    });
    debug!("Rendered news index");
    index_page(site, ResourceClass::News, lang, labels(lang).news, list)
}

/// Team index with the editorial team and the authors as separate sections.
#[instrument(level = "debug", skip_all, fields(count = members.len(), lang = lang.code()))]
pub fn render_team_index(site: &Site, members: &[EnrichedMember], lang: Language) -> OutputFile {
    let l = labels(lang);
    let mut list = String::new();

    for (view, heading) in [
        (TeamView::Team, l.editorial_team),
        (TeamView::Authors, l.authors),
    ] {
        let visible = members_in_view(members, view);
        list.push_str(&format!(
            "<section class=\"team-view\">\n<h2>{heading}</h2>\n"
        ));
        if visible.is_empty() {
            list.push_str(&format!("<p class=\"empty\">{}</p>\n", l.no_entries));
        } else {
            list.push_str("<ul>\n");
            for member in visible {
                let record = &member.record;
                let name = if record.name.trim().is_empty() {
                    l.unnamed
                } else {
                    record.name.as_str()
                };
                let roles: Vec<String> =
                    record.roles.iter().map(|r| role_label(r, lang)).collect();
                list.push_str(&format!(
                    "<li class=\"member-entry\">\n<a href=\"{}{}.html\">{}</a>\n<span class=\"roles\">{}</span>\n</li>\n",
                    record.slug(),
                    lang.suffix(),
                    esc(name),
                    esc(&roles.join(", "))
                ));
            }
            list.push_str("</ul>\n");
        }
        list.push_str("</section>\n");
    }

    debug!("Rendered team index");
    index_page(site, ResourceClass::Team, lang, l.team, list)
}
