use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use teleinfo_core::{
    DecoderConfig, DiagnosticCounts, DiagnosticKind, EnrichedRecord, FixedClock, LineSource,
    LookupTables, MAX_LINE_LEN, ProtocolVariant, ReaderLineSource, SourceError, decode_source,
};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

#[test]
fn reader_source_reads_lines_from_fixture() {
    let path = repo_root()
        .join("tests")
        .join("golden")
        .join("historical")
        .join("input.txt");
    let mut source = ReaderLineSource::open(&path).unwrap();

    let mut lines = 0;
    while let Some(line) = source.next_line().unwrap() {
        assert!(line.ends_with(b"\n"));
        lines += 1;
    }

    assert_eq!(lines, 27);
}

#[test]
fn reader_source_rejects_missing_file() {
    let path = std::env::temp_dir().join("teleinfo_missing_capture.txt");
    let _ = fs::remove_file(&path);
    let err = match ReaderLineSource::open(&path) {
        Ok(_) => panic!("expected missing file to be rejected"),
        Err(err) => err,
    };

    assert!(matches!(err, SourceError::Io(_)));
}

#[test]
fn decode_source_hands_accepted_records_to_sink() {
    let path = repo_root()
        .join("tests")
        .join("golden")
        .join("historical")
        .join("input.txt");
    let capture = fs::read(&path).unwrap();
    let source = ReaderLineSource::new(Cursor::new(capture));

    let mut sink: Vec<EnrichedRecord> = Vec::new();
    let mut counts = DiagnosticCounts::default();
    let summary = decode_source(
        source,
        DecoderConfig::new(ProtocolVariant::Historical),
        &LookupTables::default(),
        FixedClock(1),
        &mut sink,
        &mut counts,
    )
    .unwrap();

    assert_eq!(summary.frames_completed, 2);
    assert_eq!(sink.len(), 1);
    assert_eq!(sink[0].captured_at, 1);
    assert_eq!(counts.count(DiagnosticKind::FrameSuppressed), 1);
}

#[test]
fn stream_without_start_of_frame_never_emits() {
    let capture = b"ADCO 000000000000 W\r\nBASE 123456789 8\r\x03\n".repeat(3);
    let source = ReaderLineSource::new(Cursor::new(capture));

    let mut sink: Vec<EnrichedRecord> = Vec::new();
    let mut counts = DiagnosticCounts::default();
    let summary = decode_source(
        source,
        DecoderConfig::new(ProtocolVariant::Historical),
        &LookupTables::default(),
        FixedClock(1),
        &mut sink,
        &mut counts,
    )
    .unwrap();

    assert_eq!(summary.lines_total, 6);
    assert_eq!(summary.frames_completed, 0);
    assert!(sink.is_empty());
    assert_eq!(counts.total(), 0);
}

#[test]
fn overlong_line_is_reported_and_frame_survives() {
    let mut capture = b"\x02\nADCO 000000000000 W\r\n".to_vec();
    capture.extend(vec![b'Z'; MAX_LINE_LEN * 3]);
    capture.extend_from_slice(b"\r\nBASE 123456789 8\r\x03\x02\n");
    let source = ReaderLineSource::new(Cursor::new(capture));

    let mut sink: Vec<EnrichedRecord> = Vec::new();
    let mut counts = DiagnosticCounts::default();
    let summary = decode_source(
        source,
        DecoderConfig::new(ProtocolVariant::Historical),
        &LookupTables::default(),
        FixedClock(1),
        &mut sink,
        &mut counts,
    )
    .unwrap();

    assert_eq!(summary.lines_total, 4);
    assert_eq!(summary.frames_emitted, 1);
    assert!(sink[0].fields.contains_key("BASE"));
    assert_eq!(counts.count(DiagnosticKind::MalformedGroup), 1);
}
