//! Teleinfo core library: frame decoding for French electricity meters.
//!
//! This crate turns the raw serial output of a Teleinfo meter (historical or
//! standard variant) into validated, typed records: line sources feed the
//! frame assembler, which drives the protocol decoders (layout/reader/parser)
//! and hands completed frames to enrichment and then to a sink. Parsing is
//! side-effect free; I/O is isolated in `source` and `sink`.
//!
//! Invariants:
//! - A label appears at most once per frame (last write wins).
//! - Per-line and per-frame failures are reported, never fatal; only source
//!   and sink errors end a decode.
//! - The historical meter address never reaches a sink.
//!
//! Version française (résumé):
//! Cette crate décode la téléinformation client (TIC) des compteurs
//! électriques : source de lignes -> assemblage des trames (étiquette,
//! valeur, checksum) -> enrichissement (fabricant, cos phi) -> sink.
//! Les erreurs de ligne ou de trame sont signalées sans interrompre le flux.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use teleinfo_core::{DecoderConfig, LookupTables, ProtocolVariant, decode_capture_file};
//!
//! let config = DecoderConfig::new(ProtocolVariant::Historical);
//! let report = decode_capture_file(Path::new("capture.txt"), config, &LookupTables::default())?;
//! println!("frames: {}", report.summary.frames_completed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod decode;
pub mod diagnostics;
pub mod protocols;
pub mod sink;
pub mod source;
mod tables;

pub use decode::{
    AssemblerState, Clock, DecodeError, Decoder, DecoderConfig, FixedClock, FrameAssembler,
    FrameOutcome, FrameRecord, SystemClock, decode_capture, decode_capture_file, decode_source,
};
pub use diagnostics::{Diagnostic, DiagnosticCounts, DiagnosticKind, NullReporter, Reporter};
pub use protocols::value::TypedValue;
pub use protocols::variant::{ChecksumPolicy, ProtocolVariant};
pub use sink::{MeasurementPoint, PointWriter, RecordSink, SinkError};
pub use source::{LineSource, MAX_LINE_LEN, ReaderLineSource, SourceError};
pub use tables::{LookupTables, TableError, parse_labels, parse_manufacturers};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// A completed frame, enriched and ready for a sink.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
///
/// use teleinfo_core::{EnrichedRecord, ProtocolVariant, TypedValue};
///
/// let record = EnrichedRecord {
///     variant: ProtocolVariant::Historical,
///     fields: BTreeMap::from([("BASE".to_string(), TypedValue::Integer(123456789))]),
///     manufacturer: None,
///     manufacturer_code: None,
///     power_factor: None,
///     captured_at: 1_700_000_000,
///     verification_error: false,
///     unknown_labels: Vec::new(),
///     checksum_failures: Vec::new(),
/// };
/// assert!(record.checksum_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// Protocol variant the frame was decoded with.
    pub variant: ProtocolVariant,
    /// Typed values by label, in label order.
    pub fields: BTreeMap<String, TypedValue>,
    /// Manufacturer name, when the address code is in the reference table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Two-digit manufacturer code read from the meter address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_code: Option<u32>,
    /// `SINSTS / (IRMS1 * URMS1)`; absent unless all operands are non-zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_factor: Option<f64>,
    /// Capture time in unix seconds.
    pub captured_at: i64,
    /// Set when the frame carried labels outside the reference label set.
    pub verification_error: bool,
    /// Labels removed from `fields` for not being in the reference set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_labels: Vec<String>,
    /// Labels whose checksum failed (exempt labels excluded).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checksum_failures: Vec<String>,
}

impl EnrichedRecord {
    pub fn checksum_ok(&self) -> bool {
        self.checksum_failures.is_empty()
    }
}

/// Decode report for one capture, with every completed record in stream
/// order.
///
/// # Examples
/// ```
/// use teleinfo_core::{DecoderConfig, ProtocolVariant, make_stub_report};
///
/// let report = make_stub_report("capture.txt", 123, DecoderConfig::new(ProtocolVariant::Standard));
/// assert_eq!(report.report_version, teleinfo_core::REPORT_VERSION);
/// assert!(report.records.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// Decoder configuration the capture was decoded with.
    pub config: DecoderConfig,
    /// Input capture metadata.
    pub input: InputInfo,
    /// Line and frame counters.
    pub summary: DecodeSummary,
    /// Diagnostic counters by kind.
    pub diagnostics: DiagnosticCounts,
    /// Completed records, suppressed ones included.
    pub records: Vec<EnrichedRecord>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "teleinfo").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes (0 for character devices).
    pub bytes: u64,
}

/// Line and frame counters for one decode.
///
/// `frames_completed` counts end-of-frame markers seen after
/// synchronization; each completed frame is then exactly one of emitted,
/// suppressed or skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeSummary {
    pub lines_total: u64,
    pub frames_completed: u64,
    pub frames_emitted: u64,
    pub frames_suppressed: u64,
    pub frames_skipped: u64,
}

/// Build a report with base fields filled and empty aggregates.
pub fn make_stub_report(input_path: &str, input_bytes: u64, config: DecoderConfig) -> DecodeReport {
    DecodeReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "teleinfo".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        config,
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        summary: DecodeSummary::default(),
        diagnostics: DiagnosticCounts::default(),
        records: vec![],
    }
}
