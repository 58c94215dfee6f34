use thiserror::Error;

/// Errors returned by data-group parsing.
///
/// Every variant means the line is not a usable data-group; the frame
/// assembler reports it and moves on to the next line.
///
/// # Examples
/// ```
/// use teleinfo_core::protocols::group::GroupError;
///
/// let err = GroupError::TokenCount { expected: 3, actual: 4 };
/// assert!(err.to_string().contains("expected 3 tokens"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("group too short: need {needed} characters, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("group too long: at most {limit} bytes, got {actual}")]
    TooLong { limit: usize, actual: usize },
    #[error("expected {expected} tokens, got {actual}")]
    TokenCount { expected: usize, actual: usize },
    #[error("checksum is not preceded by a separator")]
    MissingChecksumSeparator,
    #[error("invalid checksum token length: {length}")]
    ChecksumLength { length: usize },
    #[error("empty label")]
    EmptyLabel,
}
