//! Per-record HTML pages and the document layout shared by every page.
//!
//! Pages carry a canonical link and `hreflang` alternates. Article pages are
//! bilingual (Spanish primary, English title and abstract embedded) and add
//! Highwire Press `citation_*` meta tags for scholarly indexers. Output is
//! fully determined by the input records, so re-running on the same data
//! yields byte-identical files.

use std::borrow::Cow;

use quick_xml::escape::escape;

use super::{OutputFile, PageKind, Site};
use crate::models::{
    ArticleRecord, EnrichedArticle, EnrichedMember, EnrichedNews, Language, NewsRecord,
    ResourceClass, TeamMemberRecord,
};
use crate::normalize::dates::parse_flexible;
use crate::utils::{excerpt, fold_for_match, html_to_text};

/// Length of meta descriptions, in characters.
const DESCRIPTION_CHARS: usize = 160;

/// Fixed interface strings in one language.
pub(crate) struct Labels {
    pub articles: &'static str,
    pub news: &'static str,
    pub team: &'static str,
    pub editorial_team: &'static str,
    pub authors: &'static str,
    pub abstract_heading: &'static str,
    pub keywords: &'static str,
    pub subject_area: &'static str,
    pub download_pdf: &'static str,
    pub undated: &'static str,
    pub interests: &'static str,
    pub unnamed: &'static str,
    pub back_to: &'static str,
    pub switch_language: &'static str,
    pub volume: &'static str,
    pub issue: &'static str,
    pub pages: &'static str,
    pub no_entries: &'static str,
}

const ES: Labels = Labels {
    articles: "Artículos",
    news: "Noticias",
    team: "Equipo",
    editorial_team: "Equipo editorial",
    authors: "Autores",
    abstract_heading: "Resumen",
    keywords: "Palabras clave",
    subject_area: "Área temática",
    download_pdf: "Descargar PDF",
    undated: "Sin fecha",
    interests: "Áreas de interés",
    unnamed: "Sin nombre",
    back_to: "Volver a",
    switch_language: "English",
    volume: "Vol.",
    issue: "núm.",
    pages: "pp.",
    no_entries: "Todavía no hay publicaciones.",
};

const EN: Labels = Labels {
    articles: "Articles",
    news: "News",
    team: "Team",
    editorial_team: "Editorial team",
    authors: "Authors",
    abstract_heading: "Abstract",
    keywords: "Keywords",
    subject_area: "Subject area",
    download_pdf: "Download PDF",
    undated: "Undated",
    interests: "Areas of interest",
    unnamed: "Unnamed",
    back_to: "Back to",
    switch_language: "Español",
    volume: "Vol.",
    issue: "no.",
    pages: "pp.",
    no_entries: "Nothing published yet.",
};

pub(crate) fn labels(lang: Language) -> &'static Labels {
    match lang {
        Language::Es => &ES,
        Language::En => &EN,
    }
}

/// Spanish role names and their English labels, keyed by folded form.
const ROLE_GLOSSARY: &[(&str, &str)] = &[
    ("autor", "Author"),
    ("autora", "Author"),
    ("editor", "Editor"),
    ("editora", "Editor"),
    ("editor en jefe", "Editor-in-Chief"),
    ("editora en jefe", "Editor-in-Chief"),
    ("revisor", "Reviewer"),
    ("revisora", "Reviewer"),
    ("director", "Director"),
    ("directora", "Director"),
    ("coordinador", "Coordinator"),
    ("coordinadora", "Coordinator"),
    ("disenador", "Designer"),
    ("disenadora", "Designer"),
    ("traductor", "Translator"),
    ("traductora", "Translator"),
    ("asesor", "Advisor"),
    ("asesora", "Advisor"),
];

/// Display label of a team role. Spanish keeps the spreadsheet wording;
/// roles missing from the glossary are shown verbatim in English too.
pub fn role_label(role: &str, lang: Language) -> String {
    let role = role.trim();
    match lang {
        Language::Es => role.to_string(),
        Language::En => {
            let folded = fold_for_match(role);
            ROLE_GLOSSARY
                .iter()
                .find(|(es, _)| *es == folded)
                .map(|(_, en)| en.to_string())
                .unwrap_or_else(|| role.to_string())
        }
    }
}

/// HTML-escape text content or attribute values.
pub(crate) fn esc(s: &str) -> Cow<'_, str> {
    escape(s)
}

pub fn article_path(record: &ArticleRecord) -> String {
    format!("{}/{}.html", ResourceClass::Articles.dir(), record.page_name())
}

pub fn news_path(record: &NewsRecord, lang: Language) -> String {
    format!("{}/{}{}.html", ResourceClass::News.dir(), record.slug(), lang.suffix())
}

pub fn member_path(record: &TeamMemberRecord, lang: Language) -> String {
    format!("{}/{}{}.html", ResourceClass::Team.dir(), record.slug(), lang.suffix())
}

pub fn index_path(class: ResourceClass, lang: Language) -> String {
    format!("{}/index{}.html", class.dir(), lang.suffix())
}

/// Everything that differs between pages; the chrome is added by [`layout`].
pub(crate) struct Document<'a> {
    pub lang: Language,
    pub title: &'a str,
    pub description: &'a str,
    pub canonical: String,
    /// `(hreflang, absolute URL)` pairs.
    pub alternates: Vec<(&'static str, String)>,
    /// Extra `<head>` markup.
    pub head: String,
    pub body: String,
}

/// `hreflang` alternates for a page that exists in both languages.
pub(crate) fn language_alternates(
    site: &Site,
    path_for: impl Fn(Language) -> String,
) -> Vec<(&'static str, String)> {
    let mut alternates: Vec<(&'static str, String)> = Language::ALL
        .iter()
        .map(|lang| (lang.code(), site.url(&path_for(*lang))))
        .collect();
    alternates.push(("x-default", site.url(&path_for(Language::Es))));
    alternates
}

/// Wrap a [`Document`] in the site chrome.
pub(crate) fn layout(site: &Site, doc: &Document<'_>) -> String {
    let l = labels(doc.lang);
    let mut out = String::with_capacity(doc.body.len() + 2048);

    out.push_str("<!DOCTYPE html>\n");
    out.push_str(&format!("<html lang=\"{}\">\n<head>\n", doc.lang.code()));
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!(
        "<title>{} | {}</title>\n",
        esc(doc.title),
        esc(&site.journal_title)
    ));
    if !doc.description.is_empty() {
        out.push_str(&format!(
            "<meta name=\"description\" content=\"{}\">\n",
            esc(doc.description)
        ));
    }
    out.push_str(&format!(
        "<link rel=\"canonical\" href=\"{}\">\n",
        esc(&doc.canonical)
    ));
    for (hreflang, href) in &doc.alternates {
        out.push_str(&format!(
            "<link rel=\"alternate\" hreflang=\"{hreflang}\" href=\"{}\">\n",
            esc(href)
        ));
    }
    out.push_str(&doc.head);
    out.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{}\">\n</head>\n<body>\n",
        site.url("css/main.css")
    ));

    out.push_str("<header class=\"site-header\">\n");
    out.push_str(&format!(
        "<a class=\"site-title\" href=\"{}\">{}</a>\n<nav>\n",
        site.base_url.as_str(),
        esc(&site.journal_title)
    ));
    for (class, label) in [
        (ResourceClass::Articles, l.articles),
        (ResourceClass::News, l.news),
        (ResourceClass::Team, l.team),
    ] {
        out.push_str(&format!(
            "<a href=\"{}\">{}</a>\n",
            site.url(&index_path(class, doc.lang)),
            label
        ));
    }
    let other = doc.lang.other().code();
    if let Some((_, href)) = doc.alternates.iter().find(|(code, _)| *code == other) {
        if *href != doc.canonical {
            out.push_str(&format!(
                "<a class=\"lang-switch\" hreflang=\"{other}\" href=\"{}\">{}</a>\n",
                esc(href),
                l.switch_language
            ));
        }
    }
    out.push_str("</nav>\n</header>\n<main>\n");

    out.push_str(&doc.body);

    out.push_str("</main>\n<footer class=\"site-footer\">\n<nav>\n");
    for section in super::sections::SECTIONS {
        out.push_str(&format!(
            "<a href=\"{}\">{}</a>\n",
            site.url(&section.path(doc.lang)),
            esc(section.title(doc.lang))
        ));
    }
    out.push_str(&format!(
        "</nav>\n<p>{}</p>\n</footer>\n</body>\n</html>\n",
        esc(&site.journal_title)
    ));
    out
}

fn citation_meta(out: &mut String, name: &str, content: &str) {
    if !content.trim().is_empty() {
        out.push_str(&format!(
            "<meta name=\"{name}\" content=\"{}\">\n",
            esc(content.trim())
        ));
    }
}

/// `YYYY/MM/DD` as indexers expect, or the raw value when it did not parse.
fn citation_date(date: &str) -> String {
    parse_flexible(date)
        .map(|d| d.format("%Y/%m/%d").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Render the bilingual page of one article.
pub fn render_article(site: &Site, article: &EnrichedArticle) -> OutputFile {
    let record = &article.record;
    let path = article_path(record);
    let canonical = site.url(&path);
    let l = labels(Language::Es);

    let mut head = String::new();
    citation_meta(&mut head, "citation_title", &article.title.es);
    for author in &record.authors {
        citation_meta(&mut head, "citation_author", author);
    }
    citation_meta(&mut head, "citation_publication_date", &citation_date(&record.date));
    citation_meta(&mut head, "citation_journal_title", &site.journal_title);
    citation_meta(&mut head, "citation_volume", &record.volume);
    citation_meta(&mut head, "citation_issue", &record.issue);
    if let Some((first, last)) = record.page_bounds() {
        citation_meta(&mut head, "citation_firstpage", first);
        citation_meta(&mut head, "citation_lastpage", last);
    }
    citation_meta(&mut head, "citation_pdf_url", &site.url(&record.pdf_path()));
    citation_meta(&mut head, "citation_keywords", &record.keywords.join("; "));
    citation_meta(&mut head, "citation_language", Language::Es.code());
    citation_meta(&mut head, "citation_abstract_html_url", &canonical);

    let mut body = String::from("<article class=\"article\">\n");
    body.push_str(&format!("<h1>{}</h1>\n", esc(&article.title.es)));
    if article.title.en != article.title.es {
        body.push_str(&format!(
            "<p class=\"title-en\" lang=\"en\">{}</p>\n",
            esc(&article.title.en)
        ));
    }
    if !record.authors.is_empty() {
        body.push_str(&format!(
            "<p class=\"authors\">{}</p>\n",
            esc(&record.authors.join(", "))
        ));
    }

    let mut details: Vec<String> = Vec::new();
    for (label, value) in [
        (l.volume, &record.volume),
        (l.issue, &record.issue),
        (l.pages, &record.pages),
    ] {
        if !value.is_empty() {
            details.push(format!("{label} {}", esc(value)));
        }
    }
    if !record.date.is_empty() {
        details.push(format!("<time datetime=\"{0}\">{0}</time>", esc(&record.date)));
    }
    if !details.is_empty() {
        body.push_str(&format!(
            "<p class=\"article-meta\">{}</p>\n",
            details.join(" · ")
        ));
    }
    if !record.subject_area.is_empty() {
        body.push_str(&format!(
            "<p class=\"subject-area\"><strong>{}:</strong> {}</p>\n",
            l.subject_area,
            esc(&record.subject_area)
        ));
    }

    for lang in Language::ALL {
        let summary = article.summary.get(lang);
        if summary.trim().is_empty() {
            continue;
        }
        body.push_str(&format!(
            "<section class=\"abstract\" lang=\"{}\">\n<h2>{}</h2>\n<p>{}</p>\n</section>\n",
            lang.code(),
            labels(lang).abstract_heading,
            esc(summary)
        ));
    }

    if !record.keywords.is_empty() {
        body.push_str(&format!(
            "<p class=\"keywords\"><strong>{}:</strong> {}</p>\n",
            l.keywords,
            esc(&record.keywords.join(", "))
        ));
    }
    body.push_str(&format!(
        "<p class=\"pdf\"><a href=\"{}\">{}</a></p>\n</article>\n",
        esc(&site.url(&record.pdf_path())),
        l.download_pdf
    ));

    let description = excerpt(&article.summary.es, DESCRIPTION_CHARS);
    let html = layout(
        site,
        &Document {
            lang: Language::Es,
            title: &article.title.es,
            description: &description,
            canonical: canonical.clone(),
            alternates: vec![
                ("es", canonical.clone()),
                ("en", canonical.clone()),
                ("x-default", canonical),
            ],
            head,
            body,
        },
    );

    OutputFile::page(path, html, PageKind::Item, parse_flexible(&record.date))
}

/// Render one language version of a news item. The body is trusted HTML.
pub fn render_news(site: &Site, item: &EnrichedNews, lang: Language) -> OutputFile {
    let record = &item.record;
    let path = news_path(record, lang);
    let l = labels(lang);
    let title = item.title.get(lang);
    let body_html = item.body.get(lang);

    let mut body = String::from("<article class=\"news\">\n");
    body.push_str(&format!("<h1>{}</h1>\n", esc(title)));
    if !record.date.is_empty() {
        body.push_str(&format!(
            "<p class=\"date\"><time datetime=\"{0}\">{0}</time></p>\n",
            esc(&record.date)
        ));
    }
    body.push_str(&format!("<div class=\"news-body\">\n{body_html}\n</div>\n"));
    body.push_str(&format!(
        "<p class=\"back\"><a href=\"index{}.html\">{} {}</a></p>\n</article>\n",
        lang.suffix(),
        l.back_to,
        l.news
    ));

    let description = excerpt(&html_to_text(body_html), DESCRIPTION_CHARS);
    let html = layout(
        site,
        &Document {
            lang,
            title,
            description: &description,
            canonical: site.url(&path),
            alternates: language_alternates(site, |lang| news_path(record, lang)),
            head: String::new(),
            body,
        },
    );

    OutputFile::page(path, html, PageKind::Item, parse_flexible(&record.date))
}

/// Render one language version of a team member's profile.
pub fn render_member(site: &Site, member: &EnrichedMember, lang: Language) -> OutputFile {
    let record = &member.record;
    let path = member_path(record, lang);
    let l = labels(lang);
    let name = if record.name.trim().is_empty() {
        l.unnamed
    } else {
        record.name.as_str()
    };

    let mut body = String::from("<article class=\"member\">\n");
    body.push_str(&format!("<h1>{}</h1>\n", esc(name)));
    if let Some(image) = &record.image_url {
        body.push_str(&format!(
            "<img class=\"portrait\" src=\"{}\" alt=\"{}\">\n",
            esc(image),
            esc(name)
        ));
    }
    let roles: Vec<String> = record.roles.iter().map(|r| role_label(r, lang)).collect();
    body.push_str(&format!(
        "<p class=\"roles\">{}</p>\n",
        esc(&roles.join(", "))
    ));
    let description = member.description.get(lang);
    if !description.trim().is_empty() {
        body.push_str(&format!("<p class=\"description\">{}</p>\n", esc(description)));
    }
    let interests = member.interests.get(lang);
    if !interests.trim().is_empty() {
        body.push_str(&format!(
            "<p class=\"interests\"><strong>{}:</strong> {}</p>\n",
            l.interests,
            esc(interests)
        ));
    }
    body.push_str(&format!(
        "<p class=\"back\"><a href=\"index{}.html\">{} {}</a></p>\n</article>\n",
        lang.suffix(),
        l.back_to,
        l.team
    ));

    let meta_description = excerpt(description, DESCRIPTION_CHARS);
    let html = layout(
        site,
        &Document {
            lang,
            title: name,
            description: &meta_description,
            canonical: site.url(&path),
            alternates: language_alternates(site, |lang| member_path(record, lang)),
            head: String::new(),
            body,
        },
    );

    OutputFile::page(path, html, PageKind::Item, None)
}
