//! Frame decoding pipeline.
//!
//! Lines pulled from a [`LineSource`] go through the [`FrameAssembler`]
//! (group parsing, checksum, typing); each completed frame is enriched,
//! checked against the [`ChecksumPolicy`] and either handed to the sink or
//! held back. Per-line and per-frame failures are reported and logged, never
//! propagated: only source and sink failures end a decode early.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, DiagnosticCounts, Reporter};
use crate::protocols::variant::{ChecksumPolicy, ProtocolVariant};
use crate::sink::{RecordSink, SinkError};
use crate::source::{LineSource, ReaderLineSource, SourceError};
use crate::tables::LookupTables;
use crate::{DecodeReport, DecodeSummary, EnrichedRecord, make_stub_report};

mod assembler;
mod enrich;
mod frame;

pub use assembler::{AssemblerState, FrameAssembler};
pub use enrich::{EnrichError, enrich, manufacturer_code, power_factor};
pub use frame::FrameRecord;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Source of capture timestamps (unix seconds).
pub trait Clock {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Always returns the same timestamp; used for reproducible reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub variant: ProtocolVariant,
    pub checksum_policy: ChecksumPolicy,
}

impl DecoderConfig {
    /// Configuration with the variant's default checksum policy.
    pub fn new(variant: ProtocolVariant) -> Self {
        Self {
            variant,
            checksum_policy: variant.default_checksum_policy(),
        }
    }

    pub fn with_checksum_policy(mut self, checksum_policy: ChecksumPolicy) -> Self {
        self.checksum_policy = checksum_policy;
        self
    }
}

/// What happened to a completed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Ready for the sink.
    Accepted(EnrichedRecord),
    /// Held back by checksum enforcement; kept for inspection only.
    Suppressed(EnrichedRecord),
}

/// One stream's decoding state: the frame assembler plus the configuration
/// and tables it enriches with.
pub struct Decoder<'t, C> {
    config: DecoderConfig,
    tables: &'t LookupTables,
    clock: C,
    assembler: FrameAssembler,
    summary: DecodeSummary,
}

impl<'t, C: Clock> Decoder<'t, C> {
    pub fn new(config: DecoderConfig, tables: &'t LookupTables, clock: C) -> Self {
        Self {
            config,
            tables,
            clock,
            assembler: FrameAssembler::new(config.variant),
            summary: DecodeSummary::default(),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn summary(&self) -> &DecodeSummary {
        &self.summary
    }

    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    pub fn push_line<R: Reporter + ?Sized>(
        &mut self,
        line: &[u8],
        reporter: &mut R,
    ) -> Option<FrameOutcome> {
        self.summary.lines_total += 1;
        let frame = self.assembler.push_line(line, reporter)?;
        self.summary.frames_completed += 1;

        let record = match enrich(frame, self.config.variant, self.tables, self.clock.now_unix()) {
            Ok(record) => record,
            Err(EnrichError::MissingRequiredField { label }) => {
                warn!(label, "frame without address, skipping enrichment");
                reporter.report(&Diagnostic::MissingRequiredField {
                    label: label.to_string(),
                });
                self.summary.frames_skipped += 1;
                return None;
            }
        };

        for label in &record.unknown_labels {
            debug!(label = %label, "unknown label");
            reporter.report(&Diagnostic::UnknownLabel {
                label: label.clone(),
            });
        }
        if let (Some(code), None) = (record.manufacturer_code, record.manufacturer.as_ref()) {
            debug!(code, "unknown manufacturer code");
            reporter.report(&Diagnostic::UnknownManufacturerCode { code });
        }

        if !record.checksum_ok() && self.config.checksum_policy == ChecksumPolicy::Enforce {
            debug!(?record, "frame suppressed by checksum enforcement");
            reporter.report(&Diagnostic::FrameSuppressed {
                checksum_failures: record.checksum_failures.clone(),
            });
            self.summary.frames_suppressed += 1;
            return Some(FrameOutcome::Suppressed(record));
        }

        self.summary.frames_emitted += 1;
        Some(FrameOutcome::Accepted(record))
    }

    /// Close the decode: logs and discards any frame still in progress.
    pub fn finish(self) -> DecodeSummary {
        if let Some(partial) = self.assembler.partial_frame() {
            debug!(groups = partial.len(), "discarding partial frame at end of input");
        }
        info!(
            lines = self.summary.lines_total,
            frames = self.summary.frames_completed,
            emitted = self.summary.frames_emitted,
            "end of input"
        );
        self.summary
    }
}

/// Pull lines until the source is exhausted, handing accepted records to
/// `sink`.
pub fn decode_source<S, C, K, R>(
    mut source: S,
    config: DecoderConfig,
    tables: &LookupTables,
    clock: C,
    sink: &mut K,
    reporter: &mut R,
) -> Result<DecodeSummary, DecodeError>
where
    S: LineSource,
    C: Clock,
    K: RecordSink + ?Sized,
    R: Reporter + ?Sized,
{
    let mut decoder = Decoder::new(config, tables, clock);
    while let Some(line) = source.next_line()? {
        if let Some(FrameOutcome::Accepted(record)) = decoder.push_line(&line, reporter) {
            sink.accept(&record)?;
        }
    }
    Ok(decoder.finish())
}

pub fn decode_capture_file(
    path: &Path,
    config: DecoderConfig,
    tables: &LookupTables,
) -> Result<DecodeReport, DecodeError> {
    let source = ReaderLineSource::open(path)?;
    decode_capture(path, source, config, tables, SystemClock)
}

/// Decode a whole capture into a report holding every completed record,
/// suppressed ones included, in stream order.
pub fn decode_capture<S: LineSource, C: Clock>(
    path: &Path,
    mut source: S,
    config: DecoderConfig,
    tables: &LookupTables,
    clock: C,
) -> Result<DecodeReport, DecodeError> {
    let mut diagnostics = DiagnosticCounts::default();
    let mut records = Vec::new();
    let mut decoder = Decoder::new(config, tables, clock);

    while let Some(line) = source.next_line()? {
        match decoder.push_line(&line, &mut diagnostics) {
            Some(FrameOutcome::Accepted(record)) | Some(FrameOutcome::Suppressed(record)) => {
                records.push(record)
            }
            None => {}
        }
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len(), config);
    report.summary = decoder.finish();
    report.diagnostics = diagnostics;
    report.records = records;
    Ok(report)
}
