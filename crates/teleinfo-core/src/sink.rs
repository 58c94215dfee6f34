//! Record sinks.
//!
//! The decoder hands each accepted [`EnrichedRecord`] to a [`RecordSink`]
//! and knows nothing about storage. [`PointWriter`] renders records as
//! time-series points (one per measurement, `{measurement, tags, time,
//! fields: {value}}`), one JSON document per line.

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::EnrichedRecord;
use crate::protocols::value::TypedValue;

pub const MANUFACTURER_MEASUREMENT: &str = "OEM";
pub const POWER_FACTOR_MEASUREMENT: &str = "COSPHI";
pub const VERIFICATION_ERROR_MEASUREMENT: &str = "verification_error";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid capture timestamp {timestamp}: {message}")]
    Timestamp { timestamp: i64, message: String },
}

pub trait RecordSink {
    fn accept(&mut self, record: &EnrichedRecord) -> Result<(), SinkError>;
}

impl<K: RecordSink + ?Sized> RecordSink for &mut K {
    fn accept(&mut self, record: &EnrichedRecord) -> Result<(), SinkError> {
        (**self).accept(record)
    }
}

impl RecordSink for Vec<EnrichedRecord> {
    fn accept(&mut self, record: &EnrichedRecord) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&TypedValue> for PointValue {
    fn from(value: &TypedValue) -> Self {
        match value {
            TypedValue::Integer(value) => Self::Integer(*value),
            TypedValue::Text(value) => Self::Text(value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFields {
    pub value: PointValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    /// RFC3339 capture time.
    pub time: String,
    pub fields: PointFields,
}

impl EnrichedRecord {
    /// One point per field, then the derived measurements that are present.
    ///
    /// # Errors
    /// Returns `SinkError::Timestamp` when `captured_at` is out of range.
    pub fn to_points(
        &self,
        tags: &BTreeMap<String, String>,
    ) -> Result<Vec<MeasurementPoint>, SinkError> {
        let time = format_timestamp(self.captured_at)?;
        let point = |measurement: &str, value: PointValue| MeasurementPoint {
            measurement: measurement.to_string(),
            tags: tags.clone(),
            time: time.clone(),
            fields: PointFields { value },
        };

        let mut points: Vec<MeasurementPoint> = self
            .fields
            .iter()
            .map(|(label, value)| point(label.as_str(), PointValue::from(value)))
            .collect();
        if let Some(manufacturer) = &self.manufacturer {
            points.push(point(
                MANUFACTURER_MEASUREMENT,
                PointValue::Text(manufacturer.clone()),
            ));
        }
        if let Some(power_factor) = self.power_factor {
            points.push(point(POWER_FACTOR_MEASUREMENT, PointValue::Float(power_factor)));
        }
        if self.verification_error {
            points.push(point(VERIFICATION_ERROR_MEASUREMENT, PointValue::Integer(1)));
        }
        Ok(points)
    }
}

fn format_timestamp(timestamp: i64) -> Result<String, SinkError> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|err| SinkError::Timestamp {
            timestamp,
            message: err.to_string(),
        })?
        .format(&Rfc3339)
        .map_err(|err| SinkError::Timestamp {
            timestamp,
            message: err.to_string(),
        })
}

/// Writes every accepted record as JSON-lines measurement points.
pub struct PointWriter<W> {
    writer: W,
    tags: BTreeMap<String, String>,
    points_written: u64,
}

impl<W: Write> PointWriter<W> {
    pub fn new(writer: W, tags: BTreeMap<String, String>) -> Self {
        Self {
            writer,
            tags,
            points_written: 0,
        }
    }

    pub fn points_written(&self) -> u64 {
        self.points_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for PointWriter<W> {
    fn accept(&mut self, record: &EnrichedRecord) -> Result<(), SinkError> {
        for point in record.to_points(&self.tags)? {
            serde_json::to_writer(&mut self.writer, &point)?;
            self.writer.write_all(b"\n")?;
            self.points_written += 1;
        }
        self.writer.flush()?;
        Ok(())
    }
}
