//! `sitemap.xml` and `robots.txt`.
//!
//! The sitemap lists the home page plus every page committed in this run,
//! once per path. `lastmod` is the record's own date when it has one and
//! the build date otherwise.

use std::collections::HashSet;

use chrono::NaiveDate;
use quick_xml::escape::escape;
use url::Url;

use super::{OutputFile, PageKind};

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const ROBOTS_FILE: &str = "robots.txt";

/// Paths crawlers should stay out of.
const DISALLOWED: &[&str] = &["/login", "/admin", "/submit", "/cart", "/api"];

/// One `<url>` of the sitemap, relative to the site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub path: String,
    pub kind: PageKind,
    pub lastmod: Option<NaiveDate>,
}

/// Sitemap entries of every page in `files`; assets are skipped.
pub fn entries_for(files: &[OutputFile]) -> Vec<SitemapEntry> {
    files
        .iter()
        .filter_map(|f| {
            f.page.map(|meta| SitemapEntry {
                path: f.path.clone(),
                kind: meta.kind,
                lastmod: meta.lastmod,
            })
        })
        .collect()
}

/// Render the sitemap. The home page comes first; duplicate paths keep
/// their first entry.
pub fn render_sitemap(base_url: &Url, entries: &[SitemapEntry], build_date: NaiveDate) -> String {
    let home = SitemapEntry {
        path: String::new(),
        kind: PageKind::Home,
        lastmod: None,
    };

    let mut seen = HashSet::new();
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for entry in std::iter::once(&home).chain(entries) {
        if !seen.insert(entry.path.as_str()) {
            continue;
        }
        let loc = format!("{}{}", base_url.as_str(), entry.path.trim_start_matches('/'));
        let lastmod = entry.lastmod.unwrap_or(build_date).format("%Y-%m-%d");
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(loc.as_str())));
        xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.kind.priority()));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Render `robots.txt`, pointing crawlers at the sitemap.
pub fn render_robots(base_url: &Url) -> String {
    let mut robots = String::from("User-agent: *\nAllow: /\n");
    for path in DISALLOWED {
        robots.push_str(&format!("Disallow: {path}\n"));
    }
    robots.push_str(&format!("\nSitemap: {}{SITEMAP_FILE}\n", base_url.as_str()));
    robots
}

/// Both crawler files, ready to commit.
pub fn crawler_files(
    base_url: &Url,
    entries: &[SitemapEntry],
    build_date: NaiveDate,
) -> Vec<OutputFile> {
    vec![
        OutputFile::asset(SITEMAP_FILE, render_sitemap(base_url, entries, build_date)),
        OutputFile::asset(ROBOTS_FILE, render_robots(base_url)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://revista.example.org/").unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sitemap_lists_home_and_pages_once() {
        let entries = vec![
            SitemapEntry {
                path: "articles/index.html".into(),
                kind: PageKind::Index,
                lastmod: None,
            },
            SitemapEntry {
                path: "news/a&b.html".into(),
                kind: PageKind::Item,
                lastmod: Some(day(2024, 3, 15)),
            },
            SitemapEntry {
                path: "articles/index.html".into(),
                kind: PageKind::Index,
                lastmod: None,
            },
        ];
        let xml = render_sitemap(&base(), &entries, day(2024, 6, 1));

        assert_eq!(xml.matches("<url>").count(), 3);
        assert!(xml.contains(
            "<loc>https://revista.example.org/</loc>\n    <lastmod>2024-06-01</lastmod>\n    <priority>1.0</priority>"
        ));
        assert!(xml.contains(
            "<loc>https://revista.example.org/articles/index.html</loc>\n    <lastmod>2024-06-01</lastmod>\n    <priority>0.8</priority>"
        ));
        assert!(xml.contains(
            "<loc>https://revista.example.org/news/a&amp;b.html</loc>\n    <lastmod>2024-03-15</lastmod>\n    <priority>0.5</priority>"
        ));
    }

    #[test]
    fn priorities_are_ordered() {
        let p = |k: PageKind| k.priority().parse::<f32>().unwrap();
        assert!(p(PageKind::Home) > p(PageKind::Index));
        assert!(p(PageKind::Index) > p(PageKind::Section));
        assert!(p(PageKind::Section) > p(PageKind::Item));
    }

    #[test]
    fn robots_blocks_private_paths_and_links_sitemap() {
        let robots = render_robots(&base());
        assert!(robots.starts_with("User-agent: *\nAllow: /\n"));
        for path in ["/login", "/admin", "/submit", "/cart", "/api"] {
            assert!(robots.contains(&format!("Disallow: {path}\n")));
        }
        assert!(robots.ends_with("Sitemap: https://revista.example.org/sitemap.xml\n"));
    }

    #[test]
    fn entries_skip_assets() {
        let files = vec![
            OutputFile::asset("articles.json", "[]".into()),
            OutputFile::page("team/index.html", String::new(), PageKind::Index, None),
        ];
        let entries = entries_for(&files);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "team/index.html");
    }
}
