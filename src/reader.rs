//! CSV decoding of uploaded transaction batches.
//!
//! The reader only decodes: it never checks that required columns are
//! present. That is the schema validator's job, so a file that is merely
//! incomplete still reads successfully and gets a precise missing-column
//! report instead of a parse failure.

use crate::error::ParseError;
use crate::schema::FeatureSchema;
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

/// One decoded cell of an uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Feature or label value; missing features are `NaN`
    Number(f64),
    /// Empty label cell
    Empty,
    /// Any non-schema column, kept verbatim
    Text(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// Column-indexed batch as uploaded, before schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawBatch {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decode a comma-separated, UTF-8 batch with a header row.
pub fn read_batch<R: Read>(reader: R, schema: &FeatureSchema) -> Result<RawBatch, ParseError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(ParseError::MissingHeader);
    }

    let columns: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut seen = HashSet::with_capacity(columns.len());
    for column in &columns {
        if !seen.insert(column.as_str()) {
            return Err(ParseError::DuplicateColumn(column.clone()));
        }
    }

    let kinds: Vec<ColumnKind> = columns
        .iter()
        .map(|c| ColumnKind::of(c, schema))
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let row = record
            .iter()
            .zip(columns.iter().zip(&kinds))
            .map(|(value, (column, kind))| kind.decode(value, column, line))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    debug!(
        columns = columns.len(),
        rows = rows.len(),
        "Decoded transaction batch"
    );

    Ok(RawBatch { columns, rows })
}

#[derive(Debug, Clone, Copy)]
enum ColumnKind {
    Feature,
    Label,
    PassThrough,
}

impl ColumnKind {
    fn of(column: &str, schema: &FeatureSchema) -> Self {
        if schema.is_feature(column) {
            ColumnKind::Feature
        } else if schema.is_label(column) {
            ColumnKind::Label
        } else {
            ColumnKind::PassThrough
        }
    }

    /// Schema cells are trimmed before parsing; pass-through text is kept as is.
    fn decode(self, raw: &str, column: &str, line: u64) -> Result<Cell, ParseError> {
        let value = raw.trim();
        match self {
            ColumnKind::Feature if value.is_empty() => Ok(Cell::Number(f64::NAN)),
            ColumnKind::Feature => {
                value
                    .parse::<f64>()
                    .map(Cell::Number)
                    .map_err(|_| ParseError::InvalidNumber {
                        line,
                        column: column.to_string(),
                        value: value.to_string(),
                    })
            }
            ColumnKind::Label if value.is_empty() => Ok(Cell::Empty),
            ColumnKind::Label => match value.parse::<f64>() {
                Ok(v) if v == 0.0 || v == 1.0 => Ok(Cell::Number(v)),
                _ => Err(ParseError::InvalidLabel {
                    line,
                    column: column.to_string(),
                    value: value.to_string(),
                }),
            },
            ColumnKind::PassThrough => Ok(Cell::Text(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::default()
    }

    #[test]
    fn test_reads_header_and_rows() {
        let data = "Time,V1,Amount,Class,note\n0,-1.35,149.62,0,first\n1, 1.19 ,2.69,1,\n";
        let batch = read_batch(data.as_bytes(), &schema()).unwrap();

        assert_eq!(batch.columns(), &["Time", "V1", "Amount", "Class", "note"]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows()[0][1], Cell::Number(-1.35));
        assert_eq!(batch.rows()[1][1], Cell::Number(1.19));
        assert_eq!(batch.rows()[1][3], Cell::Number(1.0));
        assert_eq!(batch.rows()[0][4], Cell::Text("first".to_string()));
        assert_eq!(batch.rows()[1][4], Cell::Text(String::new()));
    }

    #[test]
    fn test_pass_through_text_is_verbatim() {
        let data = "Time , Amount,note\n 3 ,\" 12.5\",\"  store 1 \"\n";
        let batch = read_batch(data.as_bytes(), &schema()).unwrap();

        assert_eq!(batch.columns(), &["Time", "Amount", "note"]);
        assert_eq!(batch.rows()[0][0], Cell::Number(3.0));
        assert_eq!(batch.rows()[0][1], Cell::Number(12.5));
        assert_eq!(batch.rows()[0][2], Cell::Text("  store 1 ".to_string()));
    }

    #[test]
    fn test_empty_feature_cell_is_missing() {
        let data = "Time,Amount,Class\n0,,\n";
        let batch = read_batch(data.as_bytes(), &schema()).unwrap();

        assert!(batch.rows()[0][1].as_number().unwrap().is_nan());
        assert_eq!(batch.rows()[0][2], Cell::Empty);
    }

    #[test]
    fn test_rejects_non_numeric_feature() {
        let data = "Time,Amount\n0,12.5\n1,abc\n";
        let err = read_batch(data.as_bytes(), &schema()).unwrap_err();

        match err {
            ParseError::InvalidNumber { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, "Amount");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_bad_label() {
        let data = "Time,Class\n0,2\n";
        let err = read_batch(data.as_bytes(), &schema()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidLabel { .. }));

        let data = "Time,Class\n0,1.0\n";
        assert!(read_batch(data.as_bytes(), &schema()).is_ok());
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let data = "Time,Amount\n0,1,2\n";
        let err = read_batch(data.as_bytes(), &schema()).unwrap_err();
        assert!(matches!(err, ParseError::Csv(_)));
    }

    #[test]
    fn test_rejects_duplicate_and_missing_header() {
        let err = read_batch("Time,Time\n1,2\n".as_bytes(), &schema()).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateColumn(c) if c == "Time"));

        let err = read_batch("".as_bytes(), &schema()).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let data: &[u8] = b"Time,Amount\n0,\xff\xfe\n";
        let err = read_batch(data, &schema()).unwrap_err();
        assert!(matches!(err, ParseError::Csv(_)));
    }

    #[test]
    fn test_header_only_reads_empty_batch() {
        let batch = read_batch("Time,Amount\n".as_bytes(), &schema()).unwrap();
        assert!(batch.is_empty());
    }
}
