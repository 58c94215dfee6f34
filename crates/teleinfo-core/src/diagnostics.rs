//! Per-line and per-frame error reporting.
//!
//! None of these conditions stops decoding: the assembler and the decoder
//! handle each at the smallest scope (one line, one frame) and hand a
//! [`Diagnostic`] to the caller's [`Reporter`] so it can be counted or
//! inspected.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MalformedGroup,
    ChecksumMismatch,
    TypeConversionFailure,
    UnknownLabel,
    MissingRequiredField,
    UnknownManufacturerCode,
    FrameSuppressed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The line does not split into a label/value/checksum group.
    MalformedGroup { line: String, reason: String },
    ChecksumMismatch {
        label: String,
        expected: char,
        found: char,
    },
    /// A numeric label held non-numeric text; the value was stored as `0`.
    TypeConversionFailure { label: String, value: String },
    /// Standard mode only: the label is not in the reference label set.
    UnknownLabel { label: String },
    /// The address label was absent; the frame was not enriched.
    MissingRequiredField { label: String },
    UnknownManufacturerCode { code: u32 },
    /// The frame failed checksum enforcement and was kept from the sink.
    FrameSuppressed { checksum_failures: Vec<String> },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::MalformedGroup { .. } => DiagnosticKind::MalformedGroup,
            Self::ChecksumMismatch { .. } => DiagnosticKind::ChecksumMismatch,
            Self::TypeConversionFailure { .. } => DiagnosticKind::TypeConversionFailure,
            Self::UnknownLabel { .. } => DiagnosticKind::UnknownLabel,
            Self::MissingRequiredField { .. } => DiagnosticKind::MissingRequiredField,
            Self::UnknownManufacturerCode { .. } => DiagnosticKind::UnknownManufacturerCode,
            Self::FrameSuppressed { .. } => DiagnosticKind::FrameSuppressed,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedGroup { line, reason } => {
                write!(f, "malformed group {line:?}: {reason}")
            }
            Self::ChecksumMismatch {
                label,
                expected,
                found,
            } => write!(
                f,
                "checksum mismatch on {label}: expected {expected:?}, found {found:?}"
            ),
            Self::TypeConversionFailure { label, value } => {
                write!(f, "{label}: {value:?} is not an integer, stored as 0")
            }
            Self::UnknownLabel { label } => write!(f, "unknown label {label}"),
            Self::MissingRequiredField { label } => write!(f, "missing required field {label}"),
            Self::UnknownManufacturerCode { code } => {
                write!(f, "unknown manufacturer code {code:02}")
            }
            Self::FrameSuppressed { checksum_failures } => write!(
                f,
                "frame suppressed, checksum failures on {}",
                checksum_failures.join(", ")
            ),
        }
    }
}

/// Hook invoked for every diagnostic raised while decoding.
pub trait Reporter {
    fn report(&mut self, diagnostic: &Diagnostic);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, diagnostic: &Diagnostic) {
        (**self).report(diagnostic);
    }
}

impl Reporter for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _diagnostic: &Diagnostic) {}
}

/// Per-kind diagnostic counters, embedded in decode reports.
///
/// # Examples
/// ```
/// use teleinfo_core::{Diagnostic, DiagnosticCounts, DiagnosticKind, Reporter};
///
/// let mut counts = DiagnosticCounts::default();
/// counts.report(&Diagnostic::UnknownLabel { label: "FOO".to_string() });
/// assert_eq!(counts.count(DiagnosticKind::UnknownLabel), 1);
/// assert!(counts.has_violations());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticCounts {
    pub malformed_group: u64,
    pub checksum_mismatch: u64,
    pub type_conversion_failure: u64,
    pub unknown_label: u64,
    pub missing_required_field: u64,
    pub unknown_manufacturer_code: u64,
    pub frame_suppressed: u64,
}

impl DiagnosticCounts {
    pub fn count(&self, kind: DiagnosticKind) -> u64 {
        match kind {
            DiagnosticKind::MalformedGroup => self.malformed_group,
            DiagnosticKind::ChecksumMismatch => self.checksum_mismatch,
            DiagnosticKind::TypeConversionFailure => self.type_conversion_failure,
            DiagnosticKind::UnknownLabel => self.unknown_label,
            DiagnosticKind::MissingRequiredField => self.missing_required_field,
            DiagnosticKind::UnknownManufacturerCode => self.unknown_manufacturer_code,
            DiagnosticKind::FrameSuppressed => self.frame_suppressed,
        }
    }

    pub fn total(&self) -> u64 {
        self.malformed_group
            + self.checksum_mismatch
            + self.type_conversion_failure
            + self.unknown_label
            + self.missing_required_field
            + self.unknown_manufacturer_code
            + self.frame_suppressed
    }

    /// Whether the stream showed wire-level corruption or labels outside the
    /// reference set.
    pub fn has_violations(&self) -> bool {
        self.malformed_group > 0 || self.checksum_mismatch > 0 || self.unknown_label > 0
    }

    fn slot(&mut self, kind: DiagnosticKind) -> &mut u64 {
        match kind {
            DiagnosticKind::MalformedGroup => &mut self.malformed_group,
            DiagnosticKind::ChecksumMismatch => &mut self.checksum_mismatch,
            DiagnosticKind::TypeConversionFailure => &mut self.type_conversion_failure,
            DiagnosticKind::UnknownLabel => &mut self.unknown_label,
            DiagnosticKind::MissingRequiredField => &mut self.missing_required_field,
            DiagnosticKind::UnknownManufacturerCode => &mut self.unknown_manufacturer_code,
            DiagnosticKind::FrameSuppressed => &mut self.frame_suppressed,
        }
    }
}

impl Reporter for DiagnosticCounts {
    fn report(&mut self, diagnostic: &Diagnostic) {
        *self.slot(diagnostic.kind()) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, DiagnosticCounts, DiagnosticKind, Reporter};

    #[test]
    fn counts_by_kind() {
        let mut counts = DiagnosticCounts::default();
        counts.report(&Diagnostic::TypeConversionFailure {
            label: "PAPP".to_string(),
            value: "X".to_string(),
        });
        counts.report(&Diagnostic::UnknownManufacturerCode { code: 13 });
        counts.report(&Diagnostic::UnknownManufacturerCode { code: 87 });

        assert_eq!(counts.count(DiagnosticKind::TypeConversionFailure), 1);
        assert_eq!(counts.count(DiagnosticKind::UnknownManufacturerCode), 2);
        assert_eq!(counts.total(), 3);
        assert!(!counts.has_violations());
    }

    #[test]
    fn checksum_mismatch_is_a_violation() {
        let mut counts = DiagnosticCounts::default();
        counts.report(&Diagnostic::ChecksumMismatch {
            label: "PAPP".to_string(),
            expected: 'A',
            found: 'B',
        });
        assert!(counts.has_violations());
    }

    fn report_missing_address<R: Reporter>(mut reporter: R) {
        reporter.report(&Diagnostic::MissingRequiredField {
            label: "ADCO".to_string(),
        });
    }

    #[test]
    fn reporter_through_mutable_reference() {
        let mut collected: Vec<Diagnostic> = Vec::new();
        report_missing_address(&mut collected);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].kind(), DiagnosticKind::MissingRequiredField);
    }

    #[test]
    fn display_names_the_label() {
        let diagnostic = Diagnostic::UnknownLabel {
            label: "FOOBAR".to_string(),
        };
        assert_eq!(diagnostic.to_string(), "unknown label FOOBAR");
    }
}
