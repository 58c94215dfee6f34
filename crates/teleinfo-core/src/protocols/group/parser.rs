use super::error::GroupError;
use super::layout;
use super::reader::GroupReader;
use crate::protocols::variant::ProtocolVariant;

/// One label/value/checksum triplet, exactly as found on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataGroup {
    pub label: String,
    pub value: String,
    pub checksum: char,
}

/// Parse one line into a data-group using the variant's separator rules.
///
/// Returns `Ok(None)` when the line carries no group at all (only framing
/// bytes or terminators).
pub fn parse_group(line: &str, variant: ProtocolVariant) -> Result<Option<DataGroup>, GroupError> {
    let reader = GroupReader::new(line);
    if reader.is_blank() {
        return Ok(None);
    }
    reader.require_max_len(layout::MAX_GROUP_LEN)?;
    let group = match variant {
        ProtocolVariant::Historical => parse_historical(&reader)?,
        ProtocolVariant::Standard => parse_standard(&reader)?,
    };
    if group.label.is_empty() {
        return Err(GroupError::EmptyLabel);
    }
    Ok(Some(group))
}

// The checksum may equal the separator, so only the first separator of the
// checksummed data splits label from value.
fn parse_historical(reader: &GroupReader<'_>) -> Result<DataGroup, GroupError> {
    reader.require_len(layout::HISTORICAL_MIN_LEN)?;
    let (data, checksum) = reader.split_trailing_checksum(layout::HISTORICAL_SEPARATOR)?;
    let (label, value) = data
        .split_once(layout::HISTORICAL_SEPARATOR)
        .ok_or(GroupError::TokenCount {
            expected: layout::HISTORICAL_TOKENS,
            actual: 1,
        })?;
    Ok(DataGroup {
        label: label.to_string(),
        value: value.to_string(),
        checksum,
    })
}

fn parse_standard(reader: &GroupReader<'_>) -> Result<DataGroup, GroupError> {
    let tokens = reader.tokens(layout::STANDARD_SEPARATOR);
    let [label, value, checksum] = tokens.as_slice() else {
        return Err(GroupError::TokenCount {
            expected: layout::STANDARD_TOKENS,
            actual: tokens.len(),
        });
    };
    let mut checksum_chars = checksum.chars();
    let checksum = match (checksum_chars.next(), checksum_chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(GroupError::ChecksumLength {
                length: checksum.chars().count(),
            });
        }
    };
    Ok(DataGroup {
        label: label.to_string(),
        value: value.to_string(),
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::{DataGroup, parse_group};
    use crate::protocols::group::error::GroupError;
    use crate::protocols::variant::ProtocolVariant;

    #[test]
    fn parse_historical_group() {
        let group = parse_group("BASE 123456789 8\r\n", ProtocolVariant::Historical)
            .unwrap()
            .unwrap();
        assert_eq!(
            group,
            DataGroup {
                label: "BASE".to_string(),
                value: "123456789".to_string(),
                checksum: '8',
            }
        );
    }

    #[test]
    fn parse_historical_space_checksum() {
        let group = parse_group("OPTARIF BASE  \r\n", ProtocolVariant::Historical)
            .unwrap()
            .unwrap();
        assert_eq!(group.label, "OPTARIF");
        assert_eq!(group.value, "BASE");
        assert_eq!(group.checksum, ' ');
    }

    #[test]
    fn parse_historical_end_of_frame_line() {
        let group = parse_group("MOTDETAT 000000 B\r\u{03}\u{02}\n", ProtocolVariant::Historical)
            .unwrap()
            .unwrap();
        assert_eq!(group.label, "MOTDETAT");
        assert_eq!(group.checksum, 'B');
    }

    #[test]
    fn parse_historical_single_token() {
        let err = parse_group("BASE 8\r\n", ProtocolVariant::Historical).unwrap_err();
        assert_eq!(
            err,
            GroupError::TokenCount {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn parse_standard_group_with_spaces_in_value() {
        let line = "MSG1\t     PAS DE          MESSAGE    \t<\r\n";
        let group = parse_group(line, ProtocolVariant::Standard).unwrap().unwrap();
        assert_eq!(group.label, "MSG1");
        assert_eq!(group.value, "     PAS DE          MESSAGE    ");
        assert_eq!(group.checksum, '<');
    }

    #[test]
    fn parse_standard_wrong_token_count() {
        let line = "DATE\tE210618150000\t\t9\r\n";
        let err = parse_group(line, ProtocolVariant::Standard).unwrap_err();
        assert_eq!(
            err,
            GroupError::TokenCount {
                expected: 3,
                actual: 4
            }
        );
    }

    #[test]
    fn parse_standard_long_checksum_token() {
        let err = parse_group("IRMS1\t004\tAB\r\n", ProtocolVariant::Standard).unwrap_err();
        assert_eq!(err, GroupError::ChecksumLength { length: 2 });
    }

    #[test]
    fn parse_blank_line() {
        assert_eq!(parse_group("\u{02}\n", ProtocolVariant::Standard), Ok(None));
        assert_eq!(parse_group("\r\n", ProtocolVariant::Historical), Ok(None));
    }

    #[test]
    fn parse_overlong_group() {
        let line = format!("PJOURF+1\t{}\t5\r\n", "0".repeat(250));
        let err = parse_group(&line, ProtocolVariant::Standard).unwrap_err();
        assert_eq!(
            err,
            GroupError::TooLong {
                limit: 200,
                actual: 261
            }
        );
    }

    #[test]
    fn parse_empty_label() {
        let err = parse_group("\t004\t2\r\n", ProtocolVariant::Standard).unwrap_err();
        assert_eq!(err, GroupError::EmptyLabel);
    }
}
