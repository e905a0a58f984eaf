//! Fixed informational pages, emitted in both languages on every run.

use super::pages::{Document, esc, language_alternates, layout};
use super::{OutputFile, PageKind, Site};
use crate::models::Language;

/// A static page. `{journal}` in the bodies is replaced by the journal title.
pub struct Section {
    pub name: &'static str,
    pub title_es: &'static str,
    pub title_en: &'static str,
    pub body_es: &'static str,
    pub body_en: &'static str,
}

impl Section {
    pub fn title(&self, lang: Language) -> &'static str {
        lang.pick(self.title_es, self.title_en)
    }

    pub fn path(&self, lang: Language) -> String {
        format!("sections/{}{}.html", self.name, lang.suffix())
    }
}

pub const SECTIONS: &[Section] = &[
    Section {
        name: "acerca",
        title_es: "Acerca de la revista",
        title_en: "About the journal",
        body_es: "<p>{journal} es una revista científica escrita, revisada y editada por \
                  estudiantes. Publica artículos originales, reseñas y divulgación en todas \
                  las áreas de la ciencia.</p>\n\
                  <p>Todos los artículos se publican en acceso abierto.</p>",
        body_en: "<p>{journal} is a science journal written, reviewed and edited by \
                  students. It publishes original articles, reviews and outreach pieces \
                  across every field of science.</p>\n\
                  <p>All articles are published open access.</p>",
    },
    Section {
        name: "normas-de-publicacion",
        title_es: "Normas de publicación",
        title_en: "Submission guidelines",
        body_es: "<p>Los manuscritos deben ser originales e inéditos y seguir la plantilla \
                  de la revista. Cada envío incluye un resumen en español y, cuando sea \
                  posible, en inglés, además de palabras clave.</p>\n\
                  <p>Todos los trabajos pasan por revisión de pares.</p>",
        body_en: "<p>Manuscripts must be original and unpublished and follow the journal \
                  template. Every submission includes an abstract in Spanish and, where \
                  possible, in English, together with keywords.</p>\n\
                  <p>All submissions are peer reviewed.</p>",
    },
    Section {
        name: "contacto",
        title_es: "Contacto",
        title_en: "Contact",
        body_es: "<p>Para consultas sobre envíos o colaboraciones, escribe al equipo \
                  editorial de {journal}.</p>",
        body_en: "<p>For questions about submissions or collaborations, write to the \
                  editorial team of {journal}.</p>",
    },
];

/// Render every section in both languages.
pub fn render_sections(site: &Site) -> Vec<OutputFile> {
    let journal = esc(&site.journal_title).into_owned();
    SECTIONS
        .iter()
        .flat_map(|section| {
            let journal = journal.clone();
            Language::ALL.into_iter().map(move |lang| {
                let title = section.title(lang);
                let body = format!(
                    "<article class=\"section\">\n<h1>{}</h1>\n{}\n</article>\n",
                    esc(title),
                    lang.pick(section.body_es, section.body_en)
                        .replace("{journal}", &journal)
                );
                let path = section.path(lang);
                let html = layout(
                    site,
                    &Document {
                        lang,
                        title,
                        description: title,
                        canonical: site.url(&path),
                        alternates: language_alternates(site, |l| section.path(l)),
                        head: String::new(),
                        body,
                    },
                );
                OutputFile::page(path, html, PageKind::Section, None)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn every_section_exists_in_both_languages() {
        let site = Site::new(Url::parse("https://revista.example.org/").unwrap(), "R & D");
        let files = render_sections(&site);
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(
            paths,
            vec![
                "sections/acerca.html",
                "sections/acerca.EN.html",
                "sections/normas-de-publicacion.html",
                "sections/normas-de-publicacion.EN.html",
                "sections/contacto.html",
                "sections/contacto.EN.html",
            ]
        );
        assert!(files[0].contents.contains("<p>R &amp; D es una revista"));
        assert!(files.iter().all(|f| f.page.map(|p| p.kind) == Some(PageKind::Section)));
    }
}
