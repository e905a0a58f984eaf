//! News sheet normalization.
//!
//! The news body is stored upstream as Base64-encoded HTML so that markup
//! survives the spreadsheet. It is decoded here, before anything renders it.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use tracing::{debug, info, instrument, warn};

use super::schema::{NEWS, NewsField};
use super::{dates, parse_table};
use crate::error::Result;
use crate::models::{NewsRecord, ResourceClass};
use crate::utils::truncate_for_log;

/// Decode a Base64 news body into HTML.
///
/// Whitespace inside the payload is ignored and padding is optional. Returns
/// `None` when the payload is not Base64 or does not decode to UTF-8.
pub fn decode_body(encoded: &str) -> Option<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(&compact))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Encode HTML the way the spreadsheet stores it.
#[cfg(test)]
pub fn encode_body(html: &str) -> String {
    STANDARD.encode(html.as_bytes())
}

/// Parse the news CSV into records, in sheet order.
///
/// Rows without a title or a body are dropped. A body that does not decode
/// is kept verbatim.
#[instrument(level = "info", skip_all, fields(bytes = input.as_ref().len()))]
pub fn parse_news(input: impl AsRef<[u8]>) -> Result<Vec<NewsRecord>> {
    let rows = parse_table(ResourceClass::News, input)?;
    let total = rows.len();
    let mut news = Vec::with_capacity(total);

    for (i, row) in rows.iter().enumerate() {
        let (Some(title), Some(body)) = (
            NEWS.value(row, NewsField::Title),
            NEWS.value(row, NewsField::Body),
        ) else {
            debug!(row = i + 2, "Skipping news row without title or body");
            continue;
        };

        let body_html = match decode_body(body) {
            Some(html) => html,
            None => {
                warn!(
                    row = i + 2,
                    body_preview = %truncate_for_log(body, 60),
                    "News body is not Base64; using it verbatim"
                );
                body.to_string()
            }
        };

        news.push(NewsRecord {
            title: title.to_string(),
            body_html,
            date: dates::normalize_date(NEWS.value(row, NewsField::Date).unwrap_or_default()),
        });
    }

    info!(rows = total, kept = news.len(), "Normalized news");
    Ok(news)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_round_trips_byte_for_byte() {
        let html = "<h2>Convocatoria 2024</h2>\n<p>¡Envía tu artículo &amp; participa!</p>\r\n<img src=\"a.png\">";
        let encoded = encode_body(html);
        assert_eq!(decode_body(&encoded).as_deref(), Some(html));
    }

    #[test]
    fn body_with_line_breaks_and_no_padding_decodes() {
        let encoded = encode_body("<p>Hola</p>");
        let unpadded = encoded.trim_end_matches('=');
        let wrapped = format!("{}\n{}", &unpadded[..4], &unpadded[4..]);
        assert_eq!(decode_body(&wrapped).as_deref(), Some("<p>Hola</p>"));
    }

    #[test]
    fn plain_text_is_not_base64() {
        assert_eq!(decode_body("<p>ya es HTML</p>"), None);
    }

    #[test]
    fn rows_are_decoded_and_filtered() {
        let body = encode_body("<p>Nueva edición publicada</p>");
        let csv = format!(
            "Título,Contenido,Fecha\nNueva edición,{body},15/03/2024\nSin cuerpo,,01/01/2024\n,{body},01/01/2024\n"
        );
        let news = parse_news(&csv).unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].body_html, "<p>Nueva edición publicada</p>");
        assert_eq!(news[0].date, "2024-03-15");
    }

    #[test]
    fn undecodable_body_is_kept_verbatim() {
        let csv = "Título,Contenido,Fecha\nAviso,<p>texto plano</p>,2024-01-01\n";
        let news = parse_news(csv).unwrap();
        assert_eq!(news[0].body_html, "<p>texto plano</p>");
    }
}
