// src/decode.rs

use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::collections::HashMap;
use thiserror::Error;

/// One decoded, unvalidated CSV line: header name → trimmed field value.
pub type RawRow = HashMap<String, String>;

/// Structural decode failure. Fatal for the whole run.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unterminated quoted field in CSV input")]
    UnterminatedQuote,
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Streaming decoder over a CSV payload. The first line is taken as the
/// header; every following line becomes one `RawRow`, mapped positionally to
/// the header names.
///
/// Rows whose trimmed `name` is empty are dropped here and never reach the
/// validator. Rows with fewer fields than the header get `""` for the missing
/// trailing columns; extra fields are ignored.
pub struct RowDecoder<'a> {
    headers: Vec<String>,
    records: StringRecordsIntoIter<&'a [u8]>,
}

impl<'a> RowDecoder<'a> {
    /// Build a decoder over the full response body. Fails if the payload's
    /// quote structure is broken or the header line cannot be parsed.
    pub fn new(text: &'a str) -> Result<Self, DecodeError> {
        // The csv reader recovers from unbalanced quotes by consuming to EOF,
        // so the structural check has to happen before parsing.
        scan_quote_structure(text)?;

        let mut reader = ReaderBuilder::new()
            .flexible(true) // tolerate rows with a different field count
            .from_reader(text.as_bytes());
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self {
            headers,
            records: reader.into_records(),
        })
    }
}

impl Iterator for RowDecoder<'_> {
    type Item = Result<RawRow, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(r) => r,
                Err(e) => return Some(Err(e.into())),
            };

            let mut row = RawRow::with_capacity(self.headers.len());
            for (i, header) in self.headers.iter().enumerate() {
                let value = record.get(i).unwrap_or("").trim();
                row.insert(header.clone(), value.to_string());
            }

            // blank-name rows are filtered at the decode layer
            if row.get("name").map_or(true, |n| n.is_empty()) {
                continue;
            }
            return Some(Ok(row));
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// A `"` was seen inside a quoted field; it either closes the field or,
    /// doubled, escapes a literal quote.
    QuoteSeen,
}

/// Walk the payload tracking RFC 4180 quote state; reaching EOF inside a
/// quoted field means the input is structurally malformed.
fn scan_quote_structure(text: &str) -> Result<(), DecodeError> {
    use QuoteState::*;

    let mut state = FieldStart;
    for b in text.bytes() {
        state = match (state, b) {
            (FieldStart, b'"') => Quoted,
            (FieldStart, b',' | b'\r' | b'\n') => FieldStart,
            (FieldStart, _) => Unquoted,
            (Unquoted, b',' | b'\r' | b'\n') => FieldStart,
            (Unquoted, _) => Unquoted,
            (Quoted, b'"') => QuoteSeen,
            (Quoted, _) => Quoted,
            (QuoteSeen, b'"') => Quoted,
            (QuoteSeen, b',' | b'\r' | b'\n') => FieldStart,
            (QuoteSeen, _) => Unquoted,
        };
    }
    if state == Quoted {
        return Err(DecodeError::UnterminatedQuote);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_rows(text: &str) -> Vec<RawRow> {
        RowDecoder::new(text)
            .expect("payload should decode")
            .collect::<Result<Vec<_>, _>>()
            .expect("rows should decode")
    }

    #[test]
    fn maps_columns_by_header_position() {
        let rows = collect_rows("name,schema,sanctions,aliases\nAcme,US-OFAC,freeze,Acme Inc\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Acme");
        assert_eq!(rows[0]["schema"], "US-OFAC");
        assert_eq!(rows[0]["sanctions"], "freeze");
        assert_eq!(rows[0]["aliases"], "Acme Inc");
    }

    #[test]
    fn drops_rows_with_blank_name() {
        let rows = collect_rows("name,schema\n,X\nBeta,Y\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Beta");
        assert_eq!(rows[0]["schema"], "Y");
    }

    #[test]
    fn drops_rows_with_whitespace_only_name() {
        let rows = collect_rows("name,schema\n   ,X\nGamma,Z\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Gamma");
    }

    #[test]
    fn short_rows_default_missing_columns_to_empty() {
        let rows = collect_rows("name,schema,sanctions,aliases\nDelta,DE\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Delta");
        assert_eq!(rows[0]["schema"], "DE");
        assert_eq!(rows[0]["sanctions"], "");
        assert_eq!(rows[0]["aliases"], "");
    }

    #[test]
    fn long_rows_ignore_extra_columns() {
        let rows = collect_rows("name,schema\nEpsilon,EU,unexpected,more\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["schema"], "EU");
    }

    #[test]
    fn trims_every_field_at_decode_time() {
        let rows =
            collect_rows("name,schema,sanctions,aliases\n  Zeta  , ZZ ,  asset freeze , Z Co \n");
        assert_eq!(rows[0]["name"], "Zeta");
        assert_eq!(rows[0]["schema"], "ZZ");
        assert_eq!(rows[0]["sanctions"], "asset freeze");
        assert_eq!(rows[0]["aliases"], "Z Co");
    }

    #[test]
    fn header_only_payload_yields_nothing() {
        let rows = collect_rows("name,schema,sanctions,aliases\n");
        assert!(rows.is_empty());
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let rows = collect_rows("name,aliases\n\"Acme, Inc\",\"A Corp; A Co.\"\n");
        assert_eq!(rows[0]["name"], "Acme, Inc");
        assert_eq!(rows[0]["aliases"], "A Corp; A Co.");
    }

    #[test]
    fn doubled_quotes_are_an_escape_not_an_error() {
        let rows = collect_rows("name,schema\n\"The \"\"Acme\"\" Group\",X\n");
        assert_eq!(rows[0]["name"], "The \"Acme\" Group");
    }

    #[test]
    fn unterminated_quote_is_a_decode_error() {
        let err = RowDecoder::new("name,schema\n\"Eta,X\n").err().expect("must fail");
        assert!(matches!(err, DecodeError::UnterminatedQuote));
    }
}
