use std::fs;
use std::path::{Path, PathBuf};

use teleinfo_core::{
    DecodeReport, DecoderConfig, FixedClock, LookupTables, ProtocolVariant, ReaderLineSource,
    decode_capture,
};

const GOLDEN_CLOCK: FixedClock = FixedClock(1_700_000_000);

fn repo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

fn load_tables() -> LookupTables {
    let data = repo_root().join("data");
    let labels = fs::read_to_string(data.join("labels_standard.tsv")).expect("read labels");
    let manufacturers =
        fs::read_to_string(data.join("manufacturers.tsv")).expect("read manufacturers");
    LookupTables::from_tsv(&labels, &manufacturers).expect("parse tables")
}

fn load_expected_report(dir: &str) -> DecodeReport {
    let expected_path = repo_root().join(dir).join("expected_report.json");

    let expected_json = fs::read_to_string(&expected_path).expect("read expected_report.json");
    serde_json::from_str(&expected_json).expect("parse expected report")
}

fn run_golden(dir: &str, variant: ProtocolVariant) {
    let input = repo_root().join(dir).join("input.txt");
    let expected = load_expected_report(dir);

    let source = ReaderLineSource::open(&input).expect("open capture");
    let mut actual = decode_capture(
        &input,
        source,
        DecoderConfig::new(variant),
        &load_tables(),
        GOLDEN_CLOCK,
    )
    .expect("decode capture");
    actual.input.path = expected.input.path.clone();

    let actual_value = serde_json::to_value(actual).expect("serialize actual");
    let expected_value = serde_json::to_value(expected).expect("serialize expected");

    assert_eq!(actual_value, expected_value, "golden mismatch in {dir}");
}

#[test]
fn golden_historical() {
    run_golden("tests/golden/historical", ProtocolVariant::Historical);
}

#[test]
fn golden_standard() {
    run_golden("tests/golden/standard", ProtocolVariant::Standard);
}

#[test]
fn golden_historical_never_exposes_address() {
    let report = load_expected_report("tests/golden/historical");
    assert_eq!(report.records.len(), 2);
    for record in &report.records {
        assert!(!record.fields.contains_key("ADCO"));
    }
}

#[test]
fn golden_historical_suppresses_bad_checksum_frame() {
    let report = load_expected_report("tests/golden/historical");
    assert_eq!(report.summary.frames_emitted, 1);
    assert_eq!(report.summary.frames_suppressed, 1);
    assert!(report.records[0].checksum_ok());
    assert_eq!(report.records[1].checksum_failures, vec!["PAPP".to_string()]);
}

#[test]
fn golden_standard_has_derived_fields() {
    let report = load_expected_report("tests/golden/standard");
    let first = &report.records[0];
    assert_eq!(first.manufacturer.as_deref(), Some("RIZ"));
    assert_eq!(first.power_factor, Some(0.5));
    assert!(first.verification_error);
    assert_eq!(first.unknown_labels, vec!["FOOBAR".to_string()]);

    let second = &report.records[1];
    assert_eq!(second.manufacturer_code, Some(13));
    assert!(second.manufacturer.is_none());
    assert!(second.power_factor.is_none());
    assert_eq!(report.summary.frames_skipped, 1);
}
