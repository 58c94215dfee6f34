//! Data-group checksum shared by both Teleinfo variants.
//!
//! The checksum is the sum of the code points of the covered characters,
//! truncated to its low 6 bits and shifted into the printable range by
//! adding `0x20`. Only the covered slice differs between variants; see
//! [`ProtocolVariant::checksum_data`](super::variant::ProtocolVariant::checksum_data).

pub const CHECKSUM_MASK: u32 = 0x3F;
pub const CHECKSUM_OFFSET: u32 = 0x20;

/// Compute the checksum character for `data`.
///
/// # Examples
/// ```
/// use teleinfo_core::protocols::checksum::compute;
///
/// assert_eq!(compute("BASE 123456789"), '8');
/// ```
pub fn compute(data: &str) -> char {
    let sum = data
        .chars()
        .fold(0u32, |acc, c| acc.wrapping_add(c as u32));
    // Always within 0x20..=0x5F.
    char::from(((sum & CHECKSUM_MASK) + CHECKSUM_OFFSET) as u8)
}

/// Check `checksum` against the checksum of `data`.
pub fn verify(data: &str, checksum: char) -> bool {
    compute(data) == checksum
}
