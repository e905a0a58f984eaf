//! Column-header-to-field mapping tables.
//!
//! The spreadsheets are keyed by human-readable Spanish headers. Every field
//! a record type reads is listed here with its accepted headers, in order of
//! preference, so a renamed column is a one-line change. A header that is
//! missing from the sheet makes the field absent; it is never an error.

use super::Row;

/// Fields read from the articles sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleField {
    Number,
    Title,
    Authors,
    AbstractEs,
    AbstractEn,
    Keywords,
    SubjectArea,
    Date,
    Volume,
    Issue,
    Pages,
}

/// Fields read from the news sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsField {
    Title,
    Body,
    Date,
}

/// Fields read from the team sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamField {
    Name,
    Roles,
    Description,
    Interests,
    Image,
}

/// A mapping from typed fields to the headers that may carry them.
#[derive(Debug)]
pub struct Schema<F: 'static> {
    pub columns: &'static [(F, &'static [&'static str])],
}

impl<F: PartialEq + Copy> Schema<F> {
    /// Accepted headers for `field`, most preferred first.
    pub fn headers(&self, field: F) -> &'static [&'static str] {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, headers)| *headers)
            .unwrap_or(&[])
    }

    /// First non-blank value among the accepted headers of `field`.
    pub fn value<'r>(&self, row: &'r Row, field: F) -> Option<&'r str> {
        self.headers(field)
            .iter()
            .filter_map(|h| row.get(*h))
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }
}

pub static ARTICLES: Schema<ArticleField> = Schema {
    columns: &[
        (
            ArticleField::Number,
            &["Número de artículo", "Numero de articulo", "Número", "Article number"],
        ),
        (ArticleField::Title, &["Título", "Titulo", "Title"]),
        (ArticleField::Authors, &["Autor(es)", "Autores", "Autor", "Author(s)"]),
        (ArticleField::AbstractEs, &["Resumen", "Abstract (Español)"]),
        (ArticleField::AbstractEn, &["Abstract", "Resumen (Inglés)", "Abstract (English)"]),
        (ArticleField::Keywords, &["Palabras clave", "Keywords"]),
        (ArticleField::SubjectArea, &["Área temática", "Area tematica", "Área", "Subject area"]),
        (ArticleField::Date, &["Fecha de publicación", "Fecha", "Date"]),
        (ArticleField::Volume, &["Volumen", "Volume"]),
        (ArticleField::Issue, &["Número de edición", "Edición", "Issue"]),
        (ArticleField::Pages, &["Páginas", "Paginas", "Pages"]),
    ],
};

pub static NEWS: Schema<NewsField> = Schema {
    columns: &[
        (NewsField::Title, &["Título", "Titulo", "Title"]),
        (NewsField::Body, &["Contenido", "Cuerpo", "Content"]),
        (NewsField::Date, &["Fecha", "Date"]),
    ],
};

pub static TEAM: Schema<TeamField> = Schema {
    columns: &[
        (TeamField::Name, &["Nombre", "Name"]),
        (TeamField::Roles, &["Rol", "Roles", "Cargo", "Role"]),
        (TeamField::Description, &["Descripción", "Descripcion", "Description"]),
        (TeamField::Interests, &["Áreas de interés", "Areas de interes", "Interests"]),
        (TeamField::Image, &["Imagen", "Foto", "Image"]),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn every_field_has_a_header() {
        use ArticleField::*;
        for f in [
            Number, Title, Authors, AbstractEs, AbstractEn, Keywords, SubjectArea, Date, Volume,
            Issue, Pages,
        ] {
            assert!(!ARTICLES.headers(f).is_empty(), "{f:?} has no header");
        }
        for f in [NewsField::Title, NewsField::Body, NewsField::Date] {
            assert!(!NEWS.headers(f).is_empty(), "{f:?} has no header");
        }
        for f in [
            TeamField::Name,
            TeamField::Roles,
            TeamField::Description,
            TeamField::Interests,
            TeamField::Image,
        ] {
            assert!(!TEAM.headers(f).is_empty(), "{f:?} has no header");
        }
    }

    #[test]
    fn fallback_header_is_used_when_preferred_is_missing() {
        let r = row(&[("Titulo", "Sin tilde")]);
        assert_eq!(ARTICLES.value(&r, ArticleField::Title), Some("Sin tilde"));
    }

    #[test]
    fn blank_preferred_value_falls_through() {
        let r = row(&[("Título", ""), ("Title", "English header")]);
        assert_eq!(ARTICLES.value(&r, ArticleField::Title), Some("English header"));
    }

    #[test]
    fn renamed_column_makes_field_absent() {
        let r = row(&[("Titular", "Renamed")]);
        assert_eq!(NEWS.value(&r, NewsField::Title), None);
    }

    #[test]
    fn abstract_headers_do_not_overlap() {
        let r = row(&[("Resumen", "Texto"), ("Abstract", "Text")]);
        assert_eq!(ARTICLES.value(&r, ArticleField::AbstractEs), Some("Texto"));
        assert_eq!(ARTICLES.value(&r, ArticleField::AbstractEn), Some("Text"));
    }
}
