//! Record lifecycle service.
//!
//! [`RecordService`] is the only writer of temperature records. It validates
//! caller input, derives the closest-to-zero value, makes a single storage
//! call per mutation and publishes a [`RecordEvent`] once the change is
//! committed. All validation and lifecycle errors are raised before any
//! write.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Config, ListingConfig};
use crate::error::{Error, Result};
use crate::events::{EventPublisher, RecordEvent};
use crate::record::{
    NewRecord, RecordFilter, RecordId, RecordPatch, RecordSummary, TemperatureRecord,
};
use crate::series::{DerivedSeries, SeriesValidator};
use crate::storage::RecordStore;

const PERSON_NAME: &str = "personName";
const TEMPERATURE_SERIES: &str = "temperatureSeries";

/// Payload for creating a record.
///
/// Fields are kept as raw JSON so type errors can be reported per field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecord {
    /// Person the series belongs to.
    #[serde(default)]
    pub person_name: Option<Value>,
    /// The samples.
    #[serde(default)]
    pub temperature_series: Option<Value>,
}

/// Payload for a partial update.
///
/// `None` means the field was absent; `Some(Value::Null)` means it was sent
/// as `null`, which is not the same thing for `personName`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    /// Replacement person name.
    #[serde(default, deserialize_with = "present")]
    pub person_name: Option<Value>,
    /// Replacement series.
    #[serde(default, deserialize_with = "present")]
    pub temperature_series: Option<Value>,
}

/// Keep explicit `null` as `Some(Value::Null)`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Parameters for listing records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring of the person name.
    pub person_name: Option<String>,
    /// Inclusive lower bound on `recordedAt`.
    pub recorded_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `recordedAt`.
    pub recorded_until: Option<DateTime<Utc>>,
    /// Requested row limit; defaulted and clamped by the service.
    pub limit: Option<usize>,
}

/// Coordinates the temperature record lifecycle.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    validator: SeriesValidator,
    listing: ListingConfig,
    events: Option<EventPublisher>,
}

impl fmt::Debug for RecordService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordService")
            .field("validator", &self.validator)
            .field("listing", &self.listing)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl RecordService {
    /// Create a service over an injected store.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        validator: SeriesValidator,
        listing: ListingConfig,
        events: Option<EventPublisher>,
    ) -> Self {
        Self {
            store,
            validator,
            listing,
            events,
        }
    }

    /// Create a service configured from `config`.
    ///
    /// An event publisher is created when `events.enabled` is set.
    #[must_use]
    pub fn from_config(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        let events = config
            .events
            .enabled
            .then(|| EventPublisher::new(config.events.channel_capacity));

        Self::new(
            store,
            SeriesValidator::from_config(&config.validation),
            config.listing.clone(),
            events,
        )
    }

    /// The event publisher, if events are enabled.
    #[must_use]
    pub fn events(&self) -> Option<&EventPublisher> {
        self.events.as_ref()
    }

    /// Create a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`], [`Error::InvalidField`] or
    /// [`Error::InvalidSeries`] for bad input, or a storage error.
    pub async fn create(&self, request: CreateRecord) -> Result<TemperatureRecord> {
        let person_name = required_name(request.person_name)?;
        let series = self.required_series(request.temperature_series)?;

        let record = NewRecord {
            person_name,
            series,
            created_at: Utc::now(),
        };
        let id = self.store.insert(record).await?;

        let created = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::internal(format!("record {id} missing after insert")))?;

        info!(
            id,
            closest_to_zero = created.closest_to_zero,
            "Created temperature record"
        );
        self.publish(RecordEvent::Created {
            id,
            at: created.created_at,
        });
        Ok(created)
    }

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the record is not active.
    pub async fn get(&self, id: RecordId) -> Result<TemperatureRecord> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(Error::NotFound { id })
    }

    /// List records, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list(&self, query: ListQuery) -> Result<Vec<TemperatureRecord>> {
        let filter = RecordFilter {
            person_name: query.person_name,
            recorded_from: query.recorded_from,
            recorded_until: query.recorded_until,
            limit: self.listing.resolve(query.limit),
        };
        debug!(?filter, "Listing temperature records");
        self.store.list(filter).await
    }

    /// Apply a partial update.
    ///
    /// Only supplied fields change. A new series is validated in full and
    /// replaces `closestToZero`. `updatedAt` never moves backwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::NoOpUpdate`],
    /// [`Error::EmptyName`], [`Error::InvalidField`] or
    /// [`Error::InvalidSeries`], or a storage error.
    pub async fn update(&self, id: RecordId, request: UpdateRecord) -> Result<TemperatureRecord> {
        let existing = self.get(id).await?;

        if request.person_name.is_none() && request.temperature_series.is_none() {
            return Err(Error::NoOpUpdate);
        }

        let person_name = request.person_name.map(replacement_name).transpose()?;
        let series = request
            .temperature_series
            .map(|value| self.derive(&value))
            .transpose()?;

        let patch = RecordPatch {
            person_name,
            series,
            updated_at: Utc::now().max(existing.updated_at),
        };
        let updated = self
            .store
            .update_fields(id, patch)
            .await?
            .ok_or(Error::NotFound { id })?;

        info!(id, "Updated temperature record");
        self.publish(RecordEvent::Updated {
            id,
            at: updated.updated_at,
        });
        Ok(updated)
    }

    /// Delete a record and return its last state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the record is not active.
    pub async fn delete(&self, id: RecordId) -> Result<TemperatureRecord> {
        let deleted = self
            .store
            .delete_by_id(id)
            .await?
            .ok_or(Error::NotFound { id })?;

        info!(id, "Deleted temperature record");
        self.publish(RecordEvent::Deleted { id, at: Utc::now() });
        Ok(deleted)
    }

    /// Count active records and distinct people.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn summary(&self) -> Result<RecordSummary> {
        self.store.count_summary().await
    }

    fn required_series(&self, value: Option<Value>) -> Result<DerivedSeries> {
        match value {
            None | Some(Value::Null) => Err(Error::MissingField {
                field: TEMPERATURE_SERIES,
            }),
            Some(Value::Array(items)) if items.is_empty() => Err(Error::MissingField {
                field: TEMPERATURE_SERIES,
            }),
            Some(value) => self.derive(&value),
        }
    }

    fn derive(&self, value: &Value) -> Result<DerivedSeries> {
        DerivedSeries::derive(self.validator.validate(value)?)
    }

    fn publish(&self, event: RecordEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

fn required_name(value: Option<Value>) -> Result<String> {
    let missing = Error::MissingField { field: PERSON_NAME };
    match value {
        None | Some(Value::Null) => Err(missing),
        Some(Value::String(name)) => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                Err(missing)
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(not_a_string()),
    }
}

fn replacement_name(value: Value) -> Result<String> {
    match value {
        Value::Null => Err(Error::EmptyName),
        Value::String(name) => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                Err(Error::EmptyName)
            } else {
                Ok(trimmed.to_string())
            }
        }
        _ => Err(not_a_string()),
    }
}

fn not_a_string() -> Error {
    Error::InvalidField {
        field: PERSON_NAME,
        reason: "must be a string",
    }
}
