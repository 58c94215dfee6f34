pub const START_OF_FRAME: u8 = 0x02;
pub const END_OF_FRAME: u8 = 0x03;

/// Bytes that frame a data-group on the wire and never belong to it.
pub const FRAMING_CHARS: [char; 4] = ['\u{02}', '\u{03}', '\r', '\n'];

pub const HISTORICAL_SEPARATOR: char = ' ';
pub const STANDARD_SEPARATOR: char = '\t';

/// Label and value; the checksum is located from the end of the line.
pub const HISTORICAL_TOKENS: usize = 2;
/// Label, value and checksum.
pub const STANDARD_TOKENS: usize = 3;

/// Shortest historical group: one-char label, separator, separator, checksum.
pub const HISTORICAL_MIN_LEN: usize = 4;
pub const CHECKSUM_LEN: usize = 1;
/// Longest group body accepted, in bytes. Real groups stay well under it
/// (the longest standard value, a day profile, is under 100 characters).
pub const MAX_GROUP_LEN: usize = 200;
