//! Storage layer for tempseries.
//!
//! This module defines the [`RecordStore`] collaborator the lifecycle service
//! depends on, and [`Storage`], its `SQLite` implementation. Series are kept
//! as JSON text next to their closest-to-zero value; timestamps are
//! fixed-width RFC 3339 text so that text order is chronological order.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{
    NewRecord, RecordFilter, RecordId, RecordPatch, RecordSummary, TemperatureRecord,
};
use crate::series::TemperatureSeries;

use self::schema::RECORD_COLUMNS;

/// Persistence boundary for temperature records.
///
/// Implementations own id assignment and must keep `temperature_series` and
/// `closest_to_zero` in sync by writing them together.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a new record and return its assigned id.
    async fn insert(&self, record: NewRecord) -> Result<RecordId>;

    /// Fetch a record by id.
    async fn get_by_id(&self, id: RecordId) -> Result<Option<TemperatureRecord>>;

    /// List records matching `filter`, newest first.
    ///
    /// The name filter is a case-insensitive substring match under Unicode
    /// lowercasing, applied here rather than in SQL because SQLite's `LIKE`
    /// folds ASCII only. The time bounds apply to `recorded_at` and are
    /// inclusive.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_records(&self, filter: &RecordFilter) -> Result<Vec<TemperatureRecord>> {
        let needle = filter
            .person_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_lowercase);

        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(from) = filter.recorded_from {
            values.push(SqlValue::Text(format_timestamp(from)));
            clauses.push(format!("recorded_at >= ?{}", values.len()));
        }
        if let Some(until) = filter.recorded_until {
            values.push(SqlValue::Text(format_timestamp(until)));
            clauses.push(format!("recorded_at <= ?{}", values.len()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        // With a name filter the limit is applied after matching.
        let limit_clause = if needle.is_none() {
            values.push(SqlValue::Integer(
                i64::try_from(filter.limit).unwrap_or(i64::MAX),
            ));
            format!("LIMIT ?{}", values.len())
        } else {
            String::new()
        };
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM temperature_records {where_clause} \
             ORDER BY created_at DESC, id DESC {limit_clause}"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            if records.len() >= filter.limit {
                break;
            }
            let record = row?;
            let matches = match &needle {
                Some(needle) => record.person_name.to_lowercase().contains(needle.as_str()),
                None => true,
            };
            if matches {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Apply a partial update.
    ///
    /// The write and the read-back run in one transaction. Returns `None` if
    /// the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_record(
        &self,
        id: RecordId,
        patch: &RecordPatch,
    ) -> Result<Option<TemperatureRecord>> {
        let mut assignments = vec!["updated_at = ?1".to_string()];
        let mut values = vec![SqlValue::Text(format_timestamp(patch.updated_at))];

        if let Some(name) = &patch.person_name {
            values.push(SqlValue::Text(name.clone()));
            assignments.push(format!("person_name = ?{}", values.len()));
        }
        if let Some(series) = &patch.series {
            values.push(SqlValue::Text(series.series().to_json()?));
            assignments.push(format!("temperature_series = ?{}", values.len()));
            values.push(SqlValue::Real(series.closest_to_zero()));
            assignments.push(format!("closest_to_zero = ?{}", values.len()));
        }

        values.push(SqlValue::Integer(id));
        let sql = format!(
            "UPDATE temperature_records SET {} WHERE id = ?{}",
            assignments.join(", "),
            values.len()
        );

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let affected = tx.execute(&sql, params_from_iter(values))?;
        if affected == 0 {
            return Ok(None);
        }
        let record = fetch_record(&tx, id)?;
        tx.commit()?;

        debug!("Updated temperature record {}", id);
        Ok(record)
    }

    /// Delete a record, returning its state just before deletion.
    ///
    /// Returns `None` if the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_record(&self, id: RecordId) -> Result<Option<TemperatureRecord>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let Some(snapshot) = fetch_record(&tx, id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM temperature_records WHERE id = ?1", [id])?;
        tx.commit()?;

        debug!("Deleted temperature record {}", id);
        Ok(Some(snapshot))
    }

    /// Count records and distinct person names.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn summary(&self) -> Result<RecordSummary> {
        let conn = self.lock()?;
        let summary = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT person_name) FROM temperature_records",
            [],
            |row| {
                Ok(RecordSummary {
                    total_records: row.get(0)?,
                    unique_people_count: row.get(1)?,
                })
            },
        )?;
        Ok(summary)
    }

    /// Run a synchronous storage operation on the blocking pool.
    async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || op(&storage))
            .await
            .map_err(|err| Error::internal(format!("storage task failed: {err}")))?
    }
}

#[async_trait]
impl RecordStore for Storage {
    async fn insert(&self, record: NewRecord) -> Result<RecordId> {
        self.run_blocking(move |storage| storage.insert_record(&record))
            .await
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<TemperatureRecord>> {
        self.run_blocking(move |storage| storage.get_record(id))
            .await
    }

    async fn list(&self, filter: RecordFilter) -> Result<Vec<TemperatureRecord>> {
        self.run_blocking(move |storage| storage.list_records(&filter))
            .await
    }

    async fn update_fields(
        &self,
        id: RecordId,
        patch: RecordPatch,
    ) -> Result<Option<TemperatureRecord>> {
        self.run_blocking(move |storage| storage.update_record(id, &patch))
            .await
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<Option<TemperatureRecord>> {
        self.run_blocking(move |storage| storage.delete_record(id))
            .await
    }

    async fn count_summary(&self) -> Result<RecordSummary> {
        self.run_blocking(Storage::summary).await
    }
}

/// Fetch one record on an open connection or transaction.
fn fetch_record(conn: &Connection, id: RecordId) -> Result<Option<TemperatureRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM temperature_records WHERE id = ?1");
    let record = conn.query_row(&sql, [id], row_to_record).optional()?;
    Ok(record)
}

/// Convert a database row to a `TemperatureRecord`.
fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TemperatureRecord> {
    let series_text: String = row.get(2)?;
    let temperature_series = TemperatureSeries::from_json(&series_text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err)))?;

    Ok(TemperatureRecord {
        id: row.get(0)?,
        person_name: row.get(1)?,
        temperature_series,
        closest_to_zero: row.get(3)?,
        recorded_at: timestamp_column(row, 4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

/// Fixed-width UTC timestamp text.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
