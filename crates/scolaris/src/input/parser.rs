//! Delimited-file parser with delimiter detection.
//!
//! Legacy school-administration systems export CSVs with wildly varying
//! delimiters (semicolon being the most common on German-locale machines),
//! so the parser auto-detects unless told otherwise. Spreadsheet binary
//! formats are converted upstream; this is the only parsing entry point
//! the core sees.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::source::{ImportTable, SourceMetadata};
use crate::error::{ImportError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Lines sampled for delimiter detection.
const SAMPLE_LINES: usize = 10;

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited import files.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the table and its metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(ImportTable, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| ImportError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let metadata = file.metadata().map_err(|e| ImportError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let size_bytes = metadata.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| ImportError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let table = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        let source = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, source))
    }

    /// Parse bytes directly with a known delimiter.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<ImportTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = if self.config.has_header {
            reader.headers()?.iter().map(|s| s.to_string()).collect()
        } else {
            match reader.records().next() {
                Some(Ok(record)) => (0..record.len())
                    .map(|i| format!("column_{}", i + 1))
                    .collect(),
                Some(Err(e)) => return Err(e.into()),
                None => return Err(ImportError::EmptyData("No data rows found".to_string())),
            }
        };

        if headers.is_empty() {
            return Err(ImportError::EmptyData("No columns found".to_string()));
        }

        let expected_cols = headers.len();

        // Re-create the reader; header extraction above may have consumed it.
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

            // Pad short rows, truncate long ones, so every row matches the header width.
            while row.len() < expected_cols {
                row.push(String::new());
            }
            row.truncate(expected_cols);

            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ImportError::EmptyData("No data rows found".to_string()));
        }

        Ok(ImportTable::new(headers, rows, delimiter))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the delimiter from a sample of the file.
///
/// A real delimiter splits every record into the same number of fields, so
/// candidates are ranked by uniformity of their per-line counts before
/// anything else. Ties go to the semicolon: the German-locale admin systems
/// these exports come from emit it almost exclusively, while commas also
/// appear inside address and guardian-name fields.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let sample: Vec<String> = BufReader::new(bytes)
        .lines()
        .take(SAMPLE_LINES)
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if sample.is_empty() {
        return Err(ImportError::EmptyData("No lines to analyze".to_string()));
    }

    let best = DELIMITERS
        .iter()
        .filter_map(|&delim| {
            let counts: Vec<usize> = sample
                .iter()
                .map(|line| unquoted_count(line, delim))
                .collect();
            let min = *counts.iter().min()?;
            let max = *counts.iter().max()?;
            if max == 0 {
                return None;
            }
            Some((delim, (min == max, min, delim == b';')))
        })
        .max_by_key(|&(_, rank)| rank);

    Ok(best.map(|(delim, _)| delim).unwrap_or(b';'))
}

/// Occurrences of `delimiter` outside double-quoted stretches.
///
/// Splitting on `"` leaves quoted content at the odd segment indices, so
/// only even segments are counted.
fn unquoted_count(line: &str, delimiter: u8) -> usize {
    line.split('"')
        .step_by(2)
        .map(|segment| segment.bytes().filter(|&b| b == delimiter).count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_semicolon() {
        let data = b"S_NAME;S_VORNAME;S_AHV\nMuster;Hans;756.1\nBeispiel;Anna;756.2";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_delimiter_quoted_commas() {
        let data = b"name;address\nMuster;\"Bahnhofstrasse 1, Bern\"\nBeispiel;\"Dorfweg 2, Thun\"";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_detect_prefers_uniform_split_over_stray_commas() {
        // Unquoted commas appear in some address fields only; the semicolon
        // splits every line into the same number of fields and must win.
        let data =
            b"S_NAME;P_ADDRESS\nMuster;Bahnhofstrasse 1, 3000 Bern\nBeispiel;Dorfweg 2\n";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_parse_csv() {
        let parser = Parser::new();
        let data = b"S_NAME,S_VORNAME,P_TEL\nMuster,Hans,0041791234567\nBeispiel,Anna,+41791112233";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.headers, vec!["S_NAME", "S_VORNAME", "P_TEL"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 0), Some("Muster"));
        assert_eq!(table.get(1, 2), Some("+41791112233"));
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let parser = Parser::new();
        let data = b"a;b;c\n1;2\n4;5;6";
        let table = parser.parse_bytes(data, b';').unwrap();

        assert_eq!(table.get(0, 2), Some(""));
        assert_eq!(table.get(1, 2), Some("6"));
    }

    #[test]
    fn test_parse_empty_fails() {
        let parser = Parser::new();
        let err = parser.parse_bytes(b"a;b;c\n", b';').unwrap_err();
        assert!(matches!(err, ImportError::EmptyData(_)));
    }
}
