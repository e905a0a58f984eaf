//! Record normalization: raw CSV bytes to typed records.
//!
//! Parsing is header-driven. The first row names the fields, every cell is
//! trimmed, and each record type then reads its fields through the mapping
//! tables in [`schema`].
//!
//! # Submodules
//!
//! | Module | Record | Discarded when |
//! |--------|--------|----------------|
//! | [`articles`] | [`ArticleRecord`](crate::models::ArticleRecord) | title or article number blank |
//! | [`news`] | [`NewsRecord`](crate::models::NewsRecord) | title or body blank |
//! | [`team`] | [`TeamMemberRecord`](crate::models::TeamMemberRecord) | roles blank |
//!
//! Discarded rows are not errors; they are logged at `debug` and skipped.

use std::collections::HashMap;

use itertools::Itertools;

use crate::error::{PipelineError, Result};
use crate::models::ResourceClass;

pub mod articles;
pub mod dates;
pub mod news;
pub mod schema;
pub mod team;

pub use articles::parse_articles;
pub use news::parse_news;
pub use team::parse_team;

/// One CSV row keyed by trimmed header name.
pub type Row = HashMap<String, String>;

/// Parse a CSV export into rows keyed by the header row.
///
/// Rows shorter than the header leave the trailing fields absent; extra
/// cells beyond the header are ignored. Input that is not valid UTF-8 is a
/// [`PipelineError::Parse`].
pub fn parse_table(class: ResourceClass, input: impl AsRef<[u8]>) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_ref());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::parse(class, e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::parse(class, e.to_string()))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Split a multi-valued cell on `;` or `,`, dropping empty segments.
pub fn split_multi(value: &str) -> Vec<String> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Like [`split_multi`], keeping only the first occurrence of each value.
pub fn split_unique(value: &str) -> Vec<String> {
    split_multi(value).into_iter().unique().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_keyed_by_trimmed_headers() {
        let text = "\u{feff} Título ,Fecha\n  Hola mundo , 15/03/2024 \n";
        let rows = parse_table(ResourceClass::News, text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Título"], "Hola mundo");
        assert_eq!(rows[0]["Fecha"], "15/03/2024");
    }

    #[test]
    fn ragged_rows_leave_fields_absent() {
        let text = "Nombre,Rol,Descripción\nAna,Editora\nLuis,Autor,Estudiante,extra\n";
        let rows = parse_table(ResourceClass::Team, text).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains_key("Descripción"));
        assert_eq!(rows[1]["Descripción"], "Estudiante");
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn quoted_cells_keep_commas() {
        let text = "Título,Autor(es)\n\"Agua, suelo y aire\",\"Ana Ruiz; Luis Gómez\"\n";
        let rows = parse_table(ResourceClass::Articles, text).unwrap();
        assert_eq!(rows[0]["Título"], "Agua, suelo y aire");
    }

    #[test]
    fn empty_payload_has_no_rows() {
        assert!(parse_table(ResourceClass::News, "").unwrap().is_empty());
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let mut bytes = b"T\xc3\xadtulo,Contenido\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe,eA==\n");
        match parse_table(ResourceClass::News, &bytes) {
            Err(PipelineError::Parse { class, .. }) => assert_eq!(class, ResourceClass::News),
            other => panic!("expected Parse, got {other:?}"),
        }

        let err = parse_table(ResourceClass::Team, b"\xffNombre,Rol\n").unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }

    #[test]
    fn split_multi_accepts_both_delimiters() {
        assert_eq!(
            split_multi("Ana Ruiz; Luis Gómez,  ;Marta Díaz ,"),
            vec!["Ana Ruiz", "Luis Gómez", "Marta Díaz"]
        );
        assert!(split_multi(" ; , ").is_empty());
    }

    #[test]
    fn split_unique_keeps_first_occurrence() {
        assert_eq!(
            split_unique("agua; suelo; agua, aire"),
            vec!["agua", "suelo", "aire"]
        );
    }
}
