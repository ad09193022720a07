//! Parsers for the per-residue tables written by the predictors.
//!
//! Both tools emit one line per residue with the label in the third
//! whitespace-delimited column. Lines starting with `#` are comments.

use crate::error::{AnnotationError, AnnotationResult, FormatError};
use std::fs;
use std::path::Path;

const COMMENT_MARKER: char = '#';
const DISORDERED: &str = "*";
const ORDERED: &str = ".";

/// Yields `(line_number, label_field)` for every data line.
fn label_fields(text: &str) -> impl Iterator<Item = Result<(usize, &str), FormatError>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.starts_with(COMMENT_MARKER) && !line.trim().is_empty())
        .map(|(idx, line)| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                Err(FormatError::MissingField {
                    line: idx + 1,
                    found: fields.len(),
                })
            } else {
                Ok((idx + 1, fields[2]))
            }
        })
}

/// Parses a Porter `.ss3`/`.ss8` table into a label string.
pub fn parse_structure_table(text: &str) -> Result<String, FormatError> {
    let mut labels = String::new();
    for entry in label_fields(text) {
        let (line, symbol) = entry?;
        let mut chars = symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => labels.push(c),
            _ => {
                return Err(FormatError::InvalidSymbol {
                    line,
                    symbol: symbol.to_string(),
                })
            }
        }
    }
    Ok(labels)
}

/// Parses an AUCpreD `.diso_noprof` table into a `0`/`1` string.
pub fn parse_disorder_table(text: &str) -> Result<String, FormatError> {
    let mut labels = String::new();
    for entry in label_fields(text) {
        let (line, symbol) = entry?;
        match symbol {
            DISORDERED => labels.push('1'),
            ORDERED => labels.push('0'),
            other => {
                return Err(FormatError::UnexpectedSymbol {
                    line,
                    symbol: other.to_string(),
                })
            }
        }
    }
    Ok(labels)
}

fn read_table(
    path: &Path,
    parse: fn(&str) -> Result<String, FormatError>,
) -> AnnotationResult<String> {
    let text = fs::read_to_string(path).map_err(|e| AnnotationError::fs(path, e))?;
    parse(&text).map_err(|source| AnnotationError::Format {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_structure_file(path: &Path) -> AnnotationResult<String> {
    read_table(path, parse_structure_table)
}

pub fn read_disorder_file(path: &Path) -> AnnotationResult<String> {
    read_table(path, parse_disorder_table)
}
