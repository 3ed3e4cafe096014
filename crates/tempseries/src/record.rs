//! Core record types for tempseries.
//!
//! This module defines the persisted [`TemperatureRecord`] and the inputs the
//! lifecycle service hands to storage. External field names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::series::{DerivedSeries, TemperatureSeries};

/// Identifier assigned by storage at creation.
pub type RecordId = i64;

/// A stored temperature series for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRecord {
    /// Unique identifier, never reused after deletion.
    pub id: RecordId,

    /// Trimmed, non-empty person name.
    pub person_name: String,

    /// The samples, in submission order.
    pub temperature_series: TemperatureSeries,

    /// The sample closest to zero, ties resolved toward the positive value.
    pub closest_to_zero: f64,

    /// When the samples were observed.
    pub recorded_at: DateTime<Utc>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Fields for a record that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// Trimmed person name.
    pub person_name: String,
    /// Validated series with its derived value.
    pub series: DerivedSeries,
    /// Creation time; also used for `recorded_at` and `updated_at`.
    pub created_at: DateTime<Utc>,
}

/// A partial update. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPatch {
    /// Replacement person name.
    pub person_name: Option<String>,
    /// Replacement series; replaces `closest_to_zero` too.
    pub series: Option<DerivedSeries>,
    /// New `updated_at`, always written.
    pub updated_at: DateTime<Utc>,
}

/// Filters for listing records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    /// Case-insensitive substring of the person name.
    pub person_name: Option<String>,
    /// Inclusive lower bound on `recorded_at`.
    pub recorded_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `recorded_at`.
    pub recorded_until: Option<DateTime<Utc>>,
    /// Maximum number of records to return.
    pub limit: usize,
}

impl RecordFilter {
    /// Default row limit when the caller gives none.
    pub const DEFAULT_LIMIT: usize = 100;

    /// A filter matching every record, up to `limit`.
    #[must_use]
    pub fn all(limit: usize) -> Self {
        Self {
            person_name: None,
            recorded_from: None,
            recorded_until: None,
            limit,
        }
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::all(Self::DEFAULT_LIMIT)
    }
}

/// Aggregate counts over active records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    /// Number of active records.
    pub total_records: i64,
    /// Number of distinct person names among them.
    pub unique_people_count: i64,
}
