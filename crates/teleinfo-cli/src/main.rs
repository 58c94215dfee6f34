use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glob::glob;
use teleinfo_core::{
    ChecksumPolicy, DecodeReport, DecoderConfig, DiagnosticCounts, DiagnosticKind, LookupTables,
    PointWriter, ProtocolVariant, ReaderLineSource, SystemClock, decode_capture_file,
    decode_source,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TELEINFO_BUILD_COMMIT"),
    " ",
    env!("TELEINFO_BUILD_DATE"),
    ")"
);

/// Read from standard input instead of a file or device.
const STDIN_INPUT: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "teleinfo")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder for the Teleinfo serial output of French electricity meters (historical / standard).",
    long_about = None,
    after_help = "Examples:\n  teleinfo decode capture.txt --mode historical -o report.json\n  teleinfo decode linky.txt --mode standard --labels data/labels_standard.tsv --manufacturers data/manufacturers.tsv --stdout\n  teleinfo stream /dev/ttyUSB0 --mode historique --host raspberry --region linky"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a capture file and generate a versioned JSON report.
    #[command(
        after_help = "Examples:\n  teleinfo decode capture.txt --mode historical -o report.json\n  teleinfo decode 'captures/*.txt' --mode historical --stdout --pretty"
    )]
    Decode {
        /// Path to a capture file (a glob matching exactly one file is accepted)
        input: PathBuf,

        #[command(flatten)]
        decoder: DecoderArgs,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code on checksum mismatches, malformed groups or unknown labels
        #[arg(long)]
        strict: bool,

        /// List diagnostic counts after decoding
        #[arg(long)]
        list_diagnostics: bool,

        /// Debug-level logging
        #[arg(short, long, conflicts_with = "quiet")]
        verbose: bool,
    },
    /// Decode a capture, a tty device or stdin ("-") and print one JSON point per line.
    #[command(
        after_help = "Examples:\n  teleinfo stream /dev/ttyUSB0 --mode historical\n  cat linky.txt | teleinfo stream - --mode standard --labels data/labels_standard.tsv --manufacturers data/manufacturers.tsv"
    )]
    Stream {
        /// Capture file, tty device (configured beforehand) or "-" for stdin
        input: PathBuf,

        #[command(flatten)]
        decoder: DecoderArgs,

        /// `host` tag attached to every point
        #[arg(long, default_value = "raspberry")]
        host: String,

        /// `region` tag attached to every point
        #[arg(long, default_value = "linky")]
        region: String,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Debug-level logging
        #[arg(short, long, conflicts_with = "quiet")]
        verbose: bool,
    },
}

#[derive(Args, Debug)]
struct DecoderArgs {
    /// Protocol variant of the meter
    #[arg(long, value_enum)]
    mode: Mode,

    /// Standard-mode label file (`code<TAB>LABEL` lines)
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Standard-mode manufacturer file (`code<TAB>name` lines)
    #[arg(long)]
    manufacturers: Option<PathBuf>,

    /// Checksum policy (default: enforce for historical, advisory for standard)
    #[arg(long, value_enum)]
    checksum: Option<Checksum>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    #[value(alias = "historique")]
    Historical,
    Standard,
}

impl From<Mode> for ProtocolVariant {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Historical => ProtocolVariant::Historical,
            Mode::Standard => ProtocolVariant::Standard,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Checksum {
    Enforce,
    Advisory,
}

impl From<Checksum> for ChecksumPolicy {
    fn from(checksum: Checksum) -> Self {
        match checksum {
            Checksum::Enforce => ChecksumPolicy::Enforce,
            Checksum::Advisory => ChecksumPolicy::Advisory,
        }
    }
}

impl DecoderArgs {
    fn config(&self) -> DecoderConfig {
        let config = DecoderConfig::new(self.mode.into());
        match self.checksum {
            Some(checksum) => config.with_checksum_policy(checksum.into()),
            None => config,
        }
    }

    /// Historical frames need no tables; standard frames need both files.
    fn load_tables(&self) -> Result<LookupTables, CliError> {
        let variant = ProtocolVariant::from(self.mode);
        if variant == ProtocolVariant::Historical {
            if self.labels.is_some() || self.manufacturers.is_some() {
                debug!("historical mode ignores --labels and --manufacturers");
            }
            return Ok(LookupTables::default());
        }

        let (Some(labels), Some(manufacturers)) = (&self.labels, &self.manufacturers) else {
            return Err(CliError::new(
                "standard mode requires --labels and --manufacturers",
                Some(
                    "use data/labels_standard.tsv and data/manufacturers.tsv from the repository"
                        .to_string(),
                ),
            ));
        };
        let labels_text = fs::read_to_string(labels)
            .with_context(|| format!("Failed to read label file: {}", labels.display()))?;
        let manufacturers_text = fs::read_to_string(manufacturers).with_context(|| {
            format!("Failed to read manufacturer file: {}", manufacturers.display())
        })?;
        let tables = LookupTables::from_tsv(&labels_text, &manufacturers_text).map_err(|err| {
            CliError::new(
                format!("invalid lookup table: {err}"),
                Some("expected tab-separated `code<TAB>value` lines".to_string()),
            )
        })?;
        info!(
            labels = tables.label_count(),
            manufacturers = tables.manufacturer_count(),
            "lookup tables loaded"
        );
        Ok(tables)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            input,
            decoder,
            report,
            stdout,
            pretty,
            compact,
            quiet,
            strict,
            list_diagnostics,
            verbose,
        } => {
            init_logging(verbose, quiet);
            cmd_decode(
                input,
                decoder,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
                list_diagnostics,
            )
        }
        Commands::Stream {
            input,
            decoder,
            host,
            region,
            quiet,
            verbose,
        } => {
            init_logging(verbose, quiet);
            cmd_stream(input, decoder, host, region, quiet)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr; stdout carries reports and points only.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_decode(
    input: PathBuf,
    decoder: DecoderArgs,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    strict: bool,
    list_diagnostics: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let tables = decoder.load_tables()?;
    let config = decoder.config();
    let rep = decode_capture_file(&resolved_input, config, &tables)
        .context("Teleinfo capture decoding failed")?;
    let json = serialize_report(&rep, pretty, compact)?;

    let Some(report) = report else {
        print!("{}", json);
        return finish_decode(&rep, quiet, strict, list_diagnostics);
    };

    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    finish_decode(&rep, quiet, strict, list_diagnostics)
}

fn finish_decode(
    rep: &DecodeReport,
    quiet: bool,
    strict: bool,
    list_diagnostics: bool,
) -> Result<(), CliError> {
    if list_diagnostics && !quiet {
        print_diagnostics(&rep.diagnostics);
    }
    if strict && rep.diagnostics.has_violations() {
        return Err(CliError::new(
            "protocol violations detected",
            Some("use --list-diagnostics to inspect".to_string()),
        ));
    }
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_abs = match report_path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(Path::new(".")),
        // A directory that does not exist yet cannot hold the input.
        Some(parent) if !parent.exists() => None,
        other => other,
    }
    .map(fs::canonicalize)
    .transpose()
    .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
    if let Some(report_dir) = report_abs {
        let report_target = report_dir.join(
            report_path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?,
        );
        if report_target == input_abs {
            return Err(CliError::new(
                format!(
                    "report path must differ from input: {}",
                    report_path.display()
                ),
                Some("choose a different output path".to_string()),
            ));
        }
    }
    Ok(())
}

fn cmd_stream(
    input: PathBuf,
    decoder: DecoderArgs,
    host: String,
    region: String,
    quiet: bool,
) -> Result<(), CliError> {
    let tables = decoder.load_tables()?;
    let config = decoder.config();
    let reader: Box<dyn BufRead> = if input.as_os_str() == STDIN_INPUT {
        Box::new(io::stdin().lock())
    } else {
        let file = fs::File::open(&input).map_err(|err| {
            CliError::new(
                format!("cannot open input {}: {}", input.display(), err),
                Some(format!(
                    "pass a capture file, a tty device set up with `stty -F <device> {} cs7 parenb -parodd`, or -",
                    config.variant.baud_rate()
                )),
            )
        })?;
        Box::new(BufReader::new(file))
    };

    let tags = BTreeMap::from([("host".to_string(), host), ("region".to_string(), region)]);
    let mut sink = PointWriter::new(io::stdout().lock(), tags);
    let mut counts = DiagnosticCounts::default();
    info!(
        variant = %config.variant,
        baud = config.variant.baud_rate(),
        checksum = %config.checksum_policy,
        "streaming"
    );
    let summary = decode_source(
        ReaderLineSource::new(reader),
        config,
        &tables,
        SystemClock,
        &mut sink,
        &mut counts,
    )
    .context("Teleinfo stream decoding failed")?;

    if !quiet {
        eprintln!(
            "OK: {} frames, {} emitted, {} points written",
            summary.frames_completed,
            summary.frames_emitted,
            sink.points_written()
        );
    }
    Ok(())
}

fn serialize_report(rep: &DecodeReport, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn print_diagnostics(counts: &DiagnosticCounts) {
    const KINDS: [DiagnosticKind; 7] = [
        DiagnosticKind::ChecksumMismatch,
        DiagnosticKind::FrameSuppressed,
        DiagnosticKind::MalformedGroup,
        DiagnosticKind::MissingRequiredField,
        DiagnosticKind::TypeConversionFailure,
        DiagnosticKind::UnknownLabel,
        DiagnosticKind::UnknownManufacturerCode,
    ];
    eprintln!("Diagnostics:");
    for kind in KINDS {
        let count = counts.count(kind);
        if count > 0 {
            eprintln!("  {} ({})", kind_name(kind), count);
        }
    }
}

fn kind_name(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::MalformedGroup => "malformed_group",
        DiagnosticKind::ChecksumMismatch => "checksum_mismatch",
        DiagnosticKind::TypeConversionFailure => "type_conversion_failure",
        DiagnosticKind::UnknownLabel => "unknown_label",
        DiagnosticKind::MissingRequiredField => "missing_required_field",
        DiagnosticKind::UnknownManufacturerCode => "unknown_manufacturer_code",
        DiagnosticKind::FrameSuppressed => "frame_suppressed",
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a Teleinfo capture (raw serial lines)".to_string()),
        ));
    }
    let meta = fs::metadata(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use `teleinfo stream` for tty devices".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let hint = "pass a single capture file, or run once per file".to_string();
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        let message = format!(
            "multiple files match pattern '{}' ({} matches); matches: {}{}",
            pattern,
            matches.len(),
            listed,
            more
        );
        return Err(CliError::new(message, Some(hint)));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
