use std::collections::BTreeMap;
use std::ops::Range;

use thiserror::Error;

use crate::EnrichedRecord;
use crate::protocols::value::TypedValue;
use crate::protocols::variant::ProtocolVariant;
use crate::tables::LookupTables;

use super::frame::FrameRecord;

/// Digits of the meter address holding the manufacturer code.
const MANUFACTURER_DIGITS: Range<usize> = 2..4;

const APPARENT_POWER_LABEL: &str = "SINSTS";
const CURRENT_LABEL: &str = "IRMS1";
const VOLTAGE_LABEL: &str = "URMS1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    #[error("missing required field {label}")]
    MissingRequiredField { label: &'static str },
}

/// Turn a completed frame into the record handed to the sink.
///
/// Historical: the meter address is removed (it must never reach the sink).
/// Standard: labels outside the reference set are removed and flagged, the
/// manufacturer is looked up from the address, and the power factor is
/// derived when its operands are present and non-zero.
pub fn enrich(
    frame: FrameRecord,
    variant: ProtocolVariant,
    tables: &LookupTables,
    now: i64,
) -> Result<EnrichedRecord, EnrichError> {
    let address_label = variant.address_label();
    let (mut fields, checksum_failures) = frame.into_parts();
    let address = fields
        .get(address_label)
        .map(TypedValue::to_string)
        .ok_or(EnrichError::MissingRequiredField {
            label: address_label,
        })?;

    let mut record = EnrichedRecord {
        variant,
        fields: BTreeMap::new(),
        manufacturer: None,
        manufacturer_code: None,
        power_factor: None,
        captured_at: now,
        verification_error: false,
        unknown_labels: Vec::new(),
        checksum_failures,
    };

    match variant {
        ProtocolVariant::Historical => {
            fields.remove(address_label);
        }
        ProtocolVariant::Standard => {
            let unknown: Vec<String> = fields
                .keys()
                .filter(|label| !tables.contains_label(label))
                .cloned()
                .collect();
            for label in &unknown {
                fields.remove(label);
            }
            record.verification_error = !unknown.is_empty();
            record.unknown_labels = unknown;

            record.manufacturer_code = manufacturer_code(&address);
            record.manufacturer = record
                .manufacturer_code
                .and_then(|code| tables.manufacturer(code))
                .map(str::to_string);
            record.power_factor = power_factor(&fields);
        }
    }

    record.fields = fields;
    Ok(record)
}

/// Two-digit manufacturer code from the address rendered as text.
pub fn manufacturer_code(address: &str) -> Option<u32> {
    let digits = address.get(MANUFACTURER_DIGITS)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `SINSTS / (IRMS1 * URMS1)`, only when all three are non-zero integers.
pub fn power_factor(fields: &BTreeMap<String, TypedValue>) -> Option<f64> {
    let apparent_power = nonzero_integer(fields, APPARENT_POWER_LABEL)?;
    let current = nonzero_integer(fields, CURRENT_LABEL)?;
    let voltage = nonzero_integer(fields, VOLTAGE_LABEL)?;
    let ratio = apparent_power as f64 / (current as f64 * voltage as f64);
    ratio.is_finite().then_some(ratio)
}

fn nonzero_integer(fields: &BTreeMap<String, TypedValue>, label: &str) -> Option<i64> {
    fields
        .get(label)
        .and_then(TypedValue::as_integer)
        .filter(|value| *value != 0)
}
