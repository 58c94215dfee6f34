//! Per-variant protocol rules.
//!
//! Historical ("historique") meters talk at 1200 baud with space-separated
//! groups; standard meters (Linky) talk at 9600 baud with tab-separated
//! groups and a richer label set. Both share framing bytes and the checksum
//! algorithm, so a single pipeline is parameterized by [`ProtocolVariant`].
//!
//! Version française (résumé):
//! Les deux modes TIC (historique et standard) ne diffèrent que par le
//! séparateur, le nombre de champs, la portée du checksum et la liste des
//! étiquettes textuelles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::group::DataGroup;
use super::group::layout;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownName {
    kind: &'static str,
    value: String,
}

const HISTORICAL_TEXT_LABELS: &[&str] = &["OPTARIF", "PTEC", "DEMAIN", "HHPHC", "MOTDETAT", "PPOT"];

const STANDARD_TEXT_LABELS: &[&str] = &[
    "DATE", "NGTF", "LTARF", "MSG1", "MSG2", "NJOURF", "NJOURF+1", "PJOURF", "PJOURF+1",
    "PPOINTE", "EASD02", "STGE", "RELAIS",
];

/// Historical meters are known to emit an unreliable checksum for this label.
const HISTORICAL_CHECKSUM_EXEMPT: &[&str] = &["MOTDETAT"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVariant {
    Historical,
    Standard,
}

/// What to do with a frame whose groups fail checksum verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Keep the frame away from the sink.
    Enforce,
    /// Report mismatches only.
    Advisory,
}

impl ProtocolVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Standard => "standard",
        }
    }

    pub fn separator(self) -> char {
        match self {
            Self::Historical => layout::HISTORICAL_SEPARATOR,
            Self::Standard => layout::STANDARD_SEPARATOR,
        }
    }

    /// Serial line settings the meter uses (baud rate; always 7 data bits,
    /// one stop bit).
    pub fn baud_rate(self) -> u32 {
        match self {
            Self::Historical => 1200,
            Self::Standard => 9600,
        }
    }

    /// Label carrying the meter address (identity).
    pub fn address_label(self) -> &'static str {
        match self {
            Self::Historical => "ADCO",
            Self::Standard => "ADSC",
        }
    }

    /// Whether `label` keeps its raw textual value instead of being typed as
    /// an integer.
    pub fn is_textual(self, label: &str) -> bool {
        let labels = match self {
            Self::Historical => HISTORICAL_TEXT_LABELS,
            Self::Standard => STANDARD_TEXT_LABELS,
        };
        labels.contains(&label)
    }

    /// Whether a checksum failure on `label` may gate a frame.
    pub fn is_checksum_exempt(self, label: &str) -> bool {
        match self {
            Self::Historical => HISTORICAL_CHECKSUM_EXEMPT.contains(&label),
            Self::Standard => false,
        }
    }

    /// Rebuild the exact character sequence covered by the group checksum.
    ///
    /// Historical: label, separator, value. Standard: label, separator,
    /// value, separator (the whole line minus checksum and terminator).
    ///
    /// # Examples
    /// ```
    /// use teleinfo_core::protocols::group::DataGroup;
    /// use teleinfo_core::protocols::variant::ProtocolVariant;
    ///
    /// let group = DataGroup {
    ///     label: "IRMS1".to_string(),
    ///     value: "004".to_string(),
    ///     checksum: '2',
    /// };
    /// assert_eq!(ProtocolVariant::Historical.checksum_data(&group), "IRMS1 004");
    /// assert_eq!(ProtocolVariant::Standard.checksum_data(&group), "IRMS1\t004\t");
    /// ```
    pub fn checksum_data(self, group: &DataGroup) -> String {
        let separator = self.separator();
        match self {
            Self::Historical => format!("{}{}{}", group.label, separator, group.value),
            Self::Standard => format!("{}{}{}{}", group.label, separator, group.value, separator),
        }
    }

    /// Historical frames are gated on checksums; standard frames only report
    /// them.
    pub fn default_checksum_policy(self) -> ChecksumPolicy {
        match self {
            Self::Historical => ChecksumPolicy::Enforce,
            Self::Standard => ChecksumPolicy::Advisory,
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVariant {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "historical" | "historique" => Ok(Self::Historical),
            "standard" => Ok(Self::Standard),
            _ => Err(UnknownName {
                kind: "protocol variant",
                value: value.to_string(),
            }),
        }
    }
}

impl ChecksumPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::Advisory => "advisory",
        }
    }
}

impl fmt::Display for ChecksumPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumPolicy {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "enforce" => Ok(Self::Enforce),
            "advisory" => Ok(Self::Advisory),
            _ => Err(UnknownName {
                kind: "checksum policy",
                value: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChecksumPolicy, ProtocolVariant};

    #[test]
    fn variant_rules() {
        assert_eq!(ProtocolVariant::Historical.separator(), ' ');
        assert_eq!(ProtocolVariant::Standard.separator(), '\t');
        assert_eq!(ProtocolVariant::Historical.baud_rate(), 1200);
        assert_eq!(ProtocolVariant::Standard.baud_rate(), 9600);
        assert_eq!(ProtocolVariant::Historical.address_label(), "ADCO");
        assert_eq!(ProtocolVariant::Standard.address_label(), "ADSC");
    }

    #[test]
    fn textual_labels_are_per_variant() {
        assert!(ProtocolVariant::Historical.is_textual("PTEC"));
        assert!(!ProtocolVariant::Historical.is_textual("BASE"));
        assert!(!ProtocolVariant::Historical.is_textual("ADCO"));
        assert!(ProtocolVariant::Standard.is_textual("NGTF"));
        assert!(ProtocolVariant::Standard.is_textual("NJOURF+1"));
        assert!(!ProtocolVariant::Standard.is_textual("PTEC"));
        assert!(!ProtocolVariant::Standard.is_textual("SINSTS"));
    }

    #[test]
    fn checksum_defaults_preserve_asymmetry() {
        assert_eq!(
            ProtocolVariant::Historical.default_checksum_policy(),
            ChecksumPolicy::Enforce
        );
        assert_eq!(
            ProtocolVariant::Standard.default_checksum_policy(),
            ChecksumPolicy::Advisory
        );
    }

    #[test]
    fn motdetat_is_exempt_only_in_historical() {
        assert!(ProtocolVariant::Historical.is_checksum_exempt("MOTDETAT"));
        assert!(!ProtocolVariant::Historical.is_checksum_exempt("PAPP"));
        assert!(!ProtocolVariant::Standard.is_checksum_exempt("MOTDETAT"));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ProtocolVariant::Standard).unwrap();
        assert_eq!(json, "\"standard\"");
        let json = serde_json::to_string(&ChecksumPolicy::Advisory).unwrap();
        assert_eq!(json, "\"advisory\"");
    }

    #[test]
    fn parses_names() {
        assert_eq!("historique".parse::<ProtocolVariant>(), Ok(ProtocolVariant::Historical));
        assert_eq!("Historical".parse::<ProtocolVariant>(), Ok(ProtocolVariant::Historical));
        assert_eq!("standard".parse::<ProtocolVariant>(), Ok(ProtocolVariant::Standard));
        assert!("linky".parse::<ProtocolVariant>().is_err());
        assert_eq!("advisory".parse::<ChecksumPolicy>(), Ok(ChecksumPolicy::Advisory));
        let err = "strict".parse::<ChecksumPolicy>().unwrap_err();
        assert_eq!(err.to_string(), "unknown checksum policy \"strict\"");
    }
}
