use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Column separator of both table files.
const TABLE_SEPARATOR: char = '\t';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("labels line {line}: expected `code<TAB>LABEL`")]
    MissingLabel { line: usize },
    #[error("manufacturers line {line}: expected `code<TAB>name`")]
    MissingManufacturer { line: usize },
    #[error("manufacturers line {line}: invalid code {code:?}")]
    InvalidCode { line: usize, code: String },
}

/// Read-only reference tables consumed by frame enrichment.
///
/// Built once by the caller (typically from the label and manufacturer
/// files) and shared by reference for the lifetime of a decode.
///
/// # Examples
/// ```
/// use teleinfo_core::LookupTables;
///
/// let tables = LookupTables::new(
///     ["ADSC", "SINSTS"].map(String::from),
///     [(4, "LANDIS+GYR".to_string())],
/// );
/// assert!(tables.contains_label("ADSC"));
/// assert_eq!(tables.manufacturer(4), Some("LANDIS+GYR"));
/// assert_eq!(tables.manufacturer(13), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTables {
    label_set: BTreeSet<String>,
    manufacturer_by_code: BTreeMap<u32, String>,
}

impl LookupTables {
    pub fn new(
        labels: impl IntoIterator<Item = String>,
        manufacturers: impl IntoIterator<Item = (u32, String)>,
    ) -> Self {
        Self {
            label_set: labels.into_iter().collect(),
            manufacturer_by_code: manufacturers.into_iter().collect(),
        }
    }

    /// Build tables from the text of the label and manufacturer files.
    pub fn from_tsv(labels: &str, manufacturers: &str) -> Result<Self, TableError> {
        Ok(Self::new(
            parse_labels(labels)?,
            parse_manufacturers(manufacturers)?,
        ))
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.label_set.contains(label)
    }

    pub fn manufacturer(&self, code: u32) -> Option<&str> {
        self.manufacturer_by_code.get(&code).map(String::as_str)
    }

    pub fn label_count(&self) -> usize {
        self.label_set.len()
    }

    pub fn manufacturer_count(&self) -> usize {
        self.manufacturer_by_code.len()
    }
}

/// Labels file: one `code<TAB>LABEL[<TAB>...]` line per label; the second
/// column is the label.
pub fn parse_labels(text: &str) -> Result<Vec<String>, TableError> {
    let mut labels = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let label = line
            .split(TABLE_SEPARATOR)
            .nth(1)
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .ok_or(TableError::MissingLabel { line: index + 1 })?;
        labels.push(label.to_string());
    }
    Ok(labels)
}

/// Manufacturers file: one `code<TAB>name` line per manufacturer.
pub fn parse_manufacturers(text: &str) -> Result<Vec<(u32, String)>, TableError> {
    let mut manufacturers = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let (code, name) = line
            .split_once(TABLE_SEPARATOR)
            .ok_or(TableError::MissingManufacturer { line: line_no })?;
        let code = code.trim();
        let code = code.parse().map_err(|_| TableError::InvalidCode {
            line: line_no,
            code: code.to_string(),
        })?;
        manufacturers.push((code, name.trim().to_string()));
    }
    Ok(manufacturers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_take_second_column() {
        let labels = parse_labels("1\tADSC\tAdresse\n2\tVTIC\n\n3\tNGTF\r\n").unwrap();
        assert_eq!(labels, vec!["ADSC", "VTIC", "NGTF"]);
    }

    #[test]
    fn labels_line_without_label_is_rejected() {
        let err = parse_labels("1\tADSC\n2\n").unwrap_err();
        assert_eq!(err, TableError::MissingLabel { line: 2 });
    }

    #[test]
    fn manufacturers_parse_codes_as_integers() {
        let manufacturers = parse_manufacturers("04\tLANDIS+GYR\n26\tRIZ\n").unwrap();
        assert_eq!(
            manufacturers,
            vec![(4, "LANDIS+GYR".to_string()), (26, "RIZ".to_string())]
        );
    }

    #[test]
    fn manufacturers_errors_name_the_line() {
        let err = parse_manufacturers("04\tLANDIS+GYR\nXX\tNOPE\n").unwrap_err();
        assert_eq!(
            err,
            TableError::InvalidCode {
                line: 2,
                code: "XX".to_string()
            }
        );
        let err = parse_manufacturers("\n04 LANDIS+GYR\n").unwrap_err();
        assert_eq!(err, TableError::MissingManufacturer { line: 2 });
    }

    #[test]
    fn from_tsv_builds_lookup_tables() {
        let tables = LookupTables::from_tsv("1\tADSC\n", "26\tRIZ\n").unwrap();
        assert_eq!(tables.label_count(), 1);
        assert_eq!(tables.manufacturer(26), Some("RIZ"));
    }
}
