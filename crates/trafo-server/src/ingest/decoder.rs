//! CSV decoding of raw upload bytes

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;

use super::error::IngestError;
use super::models::{DecodedTable, ReadingInput};

const UTF8_BOM: &str = "\u{feff}";

/// Pick `;` for decimal-comma exports whose header has no `,` at all.
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

fn malformed(err: &csv::Error) -> IngestError {
    IngestError::MalformedTable {
        line: err.position().map(|p| p.line()),
        message: err.to_string(),
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.is_empty())
}

/// Decode an upload into its header and data rows.
///
/// # Errors
///
/// - [`IngestError::Encoding`] if the bytes are not UTF-8
/// - [`IngestError::MalformedTable`] if the header is missing or unusable
/// - [`IngestError::EmptyUpload`] if there are no data rows
pub fn decode(bytes: &[u8]) -> Result<DecodedTable, IngestError> {
    let text = std::str::from_utf8(bytes).map_err(|e| IngestError::Encoding {
        offset: e.valid_up_to(),
    })?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    if text.trim().is_empty() {
        return Err(IngestError::EmptyUpload);
    }

    let delimiter = detect_delimiter(text);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header_record = reader.headers().map_err(|e| malformed(&e))?.clone();
    if is_blank(&header_record) {
        return Err(IngestError::MalformedTable {
            line: Some(1),
            message: "header row is empty".to_string(),
        });
    }

    let headers: Vec<String> = header_record.iter().map(str::to_string).collect();
    let mut seen = HashSet::new();
    if let Some(duplicate) = headers
        .iter()
        .filter(|h| !h.is_empty())
        .find(|h| !seen.insert(h.as_str()))
    {
        return Err(IngestError::MalformedTable {
            line: Some(1),
            message: format!("duplicate column '{}'", duplicate),
        });
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| malformed(&e))?;
        if is_blank(&record) {
            continue;
        }

        let row = headers
            .iter()
            .zip(record.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.as_str(), value))
            .collect::<ReadingInput>()
            .with_row(index + 1);
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(IngestError::EmptyUpload);
    }

    tracing::debug!(
        columns = headers.len(),
        rows = rows.len(),
        delimiter = %char::from(delimiter),
        "Upload decoded"
    );

    Ok(DecodedTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Datetime,Voltage R,Voltage S,Voltage T,Ampere R,Ampere S,Ampere T,Cosphi";

    #[test]
    fn test_decode_preserves_order() {
        let csv = format!(
            "{}\n2024-01-01 00:00:00,220,221,222,1,2,3,0.9\n2024-01-01 00:15:00,223,224,225,4,5,6,0.8\n",
            HEADER
        );
        let table = decode(csv.as_bytes()).unwrap();

        assert_eq!(table.headers.len(), 8);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("Voltage R"), Some("220"));
        assert_eq!(table.rows[1].get("Datetime"), Some("2024-01-01 00:15:00"));
        assert_eq!(table.rows[0].row(), 1);
        assert_eq!(table.rows[1].row(), 2);
    }

    #[test]
    fn test_blank_record_keeps_its_row_index() {
        let csv = format!(
            "{}
2024-01-01 00:00:00,220,221,222,1,2,3,0.9
,,,,,,,
2024-01-01 00:30:00,223,224,225,4,5,6,0.8
",
            HEADER
        );
        let table = decode(csv.as_bytes()).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row(), 1);
        assert_eq!(table.rows[1].row(), 3);
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = b"Datetime,Cosphi\n2024-01-01 00:00:00,\xff\xfe\n";
        assert!(matches!(decode(bytes), Err(IngestError::Encoding { offset: 36 })));
    }

    #[test]
    fn test_header_only_is_empty_upload() {
        assert!(matches!(decode(HEADER.as_bytes()), Err(IngestError::EmptyUpload)));
        assert!(matches!(
            decode(format!("{}\n\n,,,,,,,\n", HEADER).as_bytes()),
            Err(IngestError::EmptyUpload)
        ));
        assert!(matches!(decode(b"  \n"), Err(IngestError::EmptyUpload)));
    }

    #[test]
    fn test_short_rows_leave_cells_absent() {
        let csv = format!("{}\n2024-01-01 00:00:00,220\n", HEADER);
        let table = decode(csv.as_bytes()).unwrap();

        assert_eq!(table.rows[0].get("Voltage R"), Some("220"));
        assert_eq!(table.rows[0].get("Cosphi"), None);
    }

    #[test]
    fn test_bom_and_whitespace_are_stripped() {
        let csv = "\u{feff} Datetime , Cosphi \n 2024-01-01 00:00:00 , 0,5 \n";
        let table = decode(csv.as_bytes()).unwrap();

        assert_eq!(table.headers[0], "Datetime");
        assert!(table.has_column("Cosphi"));
        assert_eq!(table.rows[0].get("Datetime"), Some("2024-01-01 00:00:00"));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let csv = "Datetime;Voltage R;Cosphi\n2024-01-01 00:00:00;228,5;0,85\n";
        let table = decode(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Datetime", "Voltage R", "Cosphi"]);
        assert_eq!(table.rows[0].get("Voltage R"), Some("228,5"));
        assert_eq!(table.rows[0].get("Cosphi"), Some("0,85"));
    }

    #[test]
    fn test_duplicate_header_is_malformed() {
        let csv = "Datetime,Cosphi,Cosphi\n2024-01-01 00:00:00,1,2\n";
        match decode(csv.as_bytes()) {
            Err(IngestError::MalformedTable { line, message }) => {
                assert_eq!(line, Some(1));
                assert!(message.contains("Cosphi"));
            },
            other => panic!("expected MalformedTable, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_header_is_malformed() {
        let csv = ",,\n1,2,3\n";
        assert!(matches!(
            decode(csv.as_bytes()),
            Err(IngestError::MalformedTable { line: Some(1), .. })
        ));
    }
}
