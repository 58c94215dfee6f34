use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use teleinfo_core::{
    DecoderConfig, FixedClock, LookupTables, ProtocolVariant, ReaderLineSource, decode_capture,
};

/// Capture time stamped on every golden record.
const GOLDEN_CLOCK: FixedClock = FixedClock(1_700_000_000);

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let tables = load_tables(Path::new("data"))?;
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let input = path.join("input.txt");
        if !input.exists() {
            continue;
        }
        // Case directories are named after the variant they exercise.
        let variant = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<ProtocolVariant>().ok())
            .ok_or_else(|| format!("{}: directory is not a variant name", path.display()))?;
        let output = path.join("expected_report.json");
        regenerate_one(&input, &output, variant, &tables)?;
    }

    Ok(())
}

fn load_tables(dir: &Path) -> Result<LookupTables, String> {
    let read = |name: &str| {
        let path = dir.join(name);
        fs::read_to_string(&path).map_err(|err| format!("failed to read {}: {}", path.display(), err))
    };
    let labels = read("labels_standard.tsv")?;
    let manufacturers = read("manufacturers.tsv")?;
    LookupTables::from_tsv(&labels, &manufacturers).map_err(|err| err.to_string())
}

fn regenerate_one(
    input: &Path,
    output: &Path,
    variant: ProtocolVariant,
    tables: &LookupTables,
) -> Result<(), String> {
    let source = ReaderLineSource::open(input)
        .map_err(|err| format!("failed to open {}: {}", input.display(), err))?;
    let report = decode_capture(input, source, DecoderConfig::new(variant), tables, GOLDEN_CLOCK)
        .map_err(|err| format!("decode failed for {}: {}", input.display(), err))?;
    let json = serde_json::to_string(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
