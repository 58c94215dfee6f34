use std::fs;
use std::path::PathBuf;

use teleinfo_core::protocols::checksum;

const STX: char = '\u{02}';
const ETX: char = '\u{03}';

/// Deliberately wrong checksum; never the checksum of any group used below.
const BAD_CHECKSUM: char = '!';

fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    write_capture(root.join("historical").join("input.txt"), &historical_capture())?;
    write_capture(root.join("standard").join("input.txt"), &standard_capture())?;
    Ok(())
}

fn write_capture(path: PathBuf, lines: &[String]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    fs::write(&path, lines.concat()).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

/// Preamble cut mid-frame, one clean frame (with a bad MOTDETAT checksum,
/// which is exempt), one frame with a malformed line, a non-numeric value and
/// a bad PAPP checksum, and a trailing partial frame.
fn historical_capture() -> Vec<String> {
    let mut lines = vec![
        "TAT 000000 B\r\n".to_string(),
        end_of_frame(historical("MOTDETAT", "000000", None)),
    ];
    lines.extend(historical_frame(HistoricalFrame {
        hchp: "035972694",
        iinst: "005",
        imax: "090",
        papp: ("01289", None),
        extra: None,
        motdetat_checksum: Some(BAD_CHECKSUM),
    }));
    lines.extend(historical_frame(HistoricalFrame {
        hchp: "035972695",
        iinst: "006",
        imax: "0X0",
        papp: ("01290", Some(BAD_CHECKSUM)),
        extra: Some("IINST\r\n"),
        motdetat_checksum: None,
    }));
    lines.push(historical("ADCO", "000000000000", None));
    lines.push(historical("HCHC", "040177107", None));
    lines
}

struct HistoricalFrame {
    hchp: &'static str,
    iinst: &'static str,
    imax: &'static str,
    papp: (&'static str, Option<char>),
    extra: Option<&'static str>,
    motdetat_checksum: Option<char>,
}

fn historical_frame(frame: HistoricalFrame) -> Vec<String> {
    let mut lines = vec![
        historical("ADCO", "000000000000", None),
        historical("OPTARIF", "HC..", None),
        historical("ISOUSC", "45", None),
        // Its checksum is a space, the same byte as the separator.
        historical("HCHC", "040177106", None),
        historical("HCHP", frame.hchp, None),
        historical("PTEC", "HP..", None),
        historical("IINST", frame.iinst, None),
        historical("IMAX", frame.imax, None),
    ];
    if let Some(extra) = frame.extra {
        lines.push(extra.to_string());
    }
    lines.push(historical("PAPP", frame.papp.0, frame.papp.1));
    lines.push(historical("HHPHC", "A", None));
    lines.push(end_of_frame(historical(
        "MOTDETAT",
        "000000",
        frame.motdetat_checksum,
    )));
    lines
}

/// Preamble, a frame with an unknown label, a four-token DATE group and a
/// bad EAST checksum, a frame with an unknown manufacturer and zero current,
/// and a frame without address.
fn standard_capture() -> Vec<String> {
    let mut lines = vec![
        standard("SINSTS", "00857", None),
        end_of_frame(standard(
            "PJOURF+1",
            "00008001 NONUTILE NONUTILE NONUTILE NONUTILE NONUTILE NONUTILE NONUTILE NONUTILE NONUTILE NONUTILE",
            None,
        )),
        standard("ADSC", "042263123456", None),
        standard("VTIC", "02", None),
        format!(
            "DATE\tH231114231320\t\t{}\r\n",
            checksum::compute("DATE\tH231114231320\t\t")
        ),
        standard("NGTF", "TEMPO           ", None),
        standard("LTARF", "    HP  BLEU    ", None),
        standard("EAST", "024779773", Some(BAD_CHECKSUM)),
        standard("EASF01", "023785769", None),
        standard("IRMS1", "004", None),
        standard("URMS1", "250", None),
        standard("PREF", "09", None),
        standard("SINSTS", "00500", None),
        standard("FOOBAR", "1", None),
        standard("STGE", "003A0001", None),
        standard("MSG1", "PAS DE          MESSAGE         ", None),
        end_of_frame(standard("RELAIS", "000", None)),
    ];
    lines.extend([
        standard("ADSC", "811387654321", None),
        standard("VTIC", "02", None),
        standard("NGTF", "H PLEINE/CREUSE ", None),
        standard("IRMS1", "000", None),
        standard("URMS1", "231", None),
        standard("SINSTS", "00000", None),
        end_of_frame(standard("RELAIS", "000", None)),
    ]);
    lines.extend([
        standard("VTIC", "02", None),
        standard("SINSTS", "00120", None),
        end_of_frame(standard("RELAIS", "000", None)),
    ]);
    lines
}

fn historical(label: &str, value: &str, checksum: Option<char>) -> String {
    let checksum = checksum.unwrap_or_else(|| checksum::compute(&format!("{label} {value}")));
    format!("{label} {value} {checksum}\r\n")
}

fn standard(label: &str, value: &str, checksum: Option<char>) -> String {
    let checksum = checksum.unwrap_or_else(|| checksum::compute(&format!("{label}\t{value}\t")));
    format!("{label}\t{value}\t{checksum}\r\n")
}

/// Replace the line terminator with the end/start-of-frame boundary.
fn end_of_frame(line: String) -> String {
    let group = line.trim_end_matches(['\r', '\n']);
    format!("{group}\r{ETX}{STX}\n")
}
