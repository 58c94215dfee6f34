use super::error::GroupError;
use super::layout;

/// Read access to one line with its framing bytes removed.
///
/// Start/end-of-frame bytes and the CR/LF terminators only ever surround a
/// group, so they are trimmed from both ends; separators and the checksum
/// (which may itself be a space) are left untouched.
pub struct GroupReader<'a> {
    body: &'a str,
}

impl<'a> GroupReader<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            body: line.trim_matches(&layout::FRAMING_CHARS[..]),
        }
    }

    pub fn body(&self) -> &'a str {
        self.body
    }

    pub fn is_blank(&self) -> bool {
        self.body.is_empty()
    }

    pub fn require_max_len(&self, limit: usize) -> Result<(), GroupError> {
        let actual = self.body.len();
        if actual > limit {
            return Err(GroupError::TooLong { limit, actual });
        }
        Ok(())
    }

    pub fn require_len(&self, needed: usize) -> Result<(), GroupError> {
        let actual = self.body.chars().count();
        if actual < needed {
            return Err(GroupError::TooShort { needed, actual });
        }
        Ok(())
    }

    /// Split off the last character as the checksum, requiring `separator`
    /// right before it. Returns the checksummed data and the checksum.
    pub fn split_trailing_checksum(&self, separator: char) -> Result<(&'a str, char), GroupError> {
        let mut chars = self.body.char_indices().rev();
        let (_, checksum) = chars.next().ok_or(GroupError::TooShort {
            needed: layout::CHECKSUM_LEN,
            actual: 0,
        })?;
        match chars.next() {
            Some((index, c)) if c == separator => Ok((&self.body[..index], checksum)),
            _ => Err(GroupError::MissingChecksumSeparator),
        }
    }

    pub fn tokens(&self, separator: char) -> Vec<&'a str> {
        self.body.split(separator).collect()
    }
}
