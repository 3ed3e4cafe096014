//! Request handlers for the temperature record API.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::record::{RecordId, RecordSummary, TemperatureRecord};
use crate::service::{CreateRecord, ListQuery, RecordService, UpdateRecord};

use super::error::ApiError;

/// Success envelope: `{ "success": true, "data": ..., "message"?, "count"? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

impl<T> ApiResponse<T> {
    fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            count: None,
        }
    }

    fn with_message(message: &'static str, data: T) -> Self {
        Self {
            message: Some(message),
            ..Self::data(data)
        }
    }
}

/// Query string for the list endpoint. Values are parsed by hand so that a
/// bad value yields a field-specific message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    person_name: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    limit: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<ListQuery> {
        let limit = self
            .limit
            .as_deref()
            .map(|raw| {
                raw.trim().parse::<usize>().map_err(|_| Error::InvalidField {
                    field: "limit",
                    reason: "must be a non-negative integer",
                })
            })
            .transpose()?;

        Ok(ListQuery {
            person_name: self.person_name,
            recorded_from: self
                .start_date
                .as_deref()
                .map(|raw| parse_date("startDate", raw))
                .transpose()?,
            recorded_until: self
                .end_date
                .as_deref()
                .map(|raw| parse_date("endDate", raw))
                .transpose()?,
            limit,
        })
    }
}

/// Accept an RFC 3339 timestamp, or a bare date meaning midnight UTC.
///
/// Years are limited to 0000..=9999 so bounds compare correctly against the
/// fixed-width stored timestamps.
fn parse_date(field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    let at = match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => at.with_timezone(&Utc),
        Err(_) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc())
            .ok_or(Error::InvalidField {
                field,
                reason: "must be an RFC 3339 timestamp or a YYYY-MM-DD date",
            })?,
    };

    if !(0..=9999).contains(&at.year()) {
        return Err(Error::InvalidField {
            field,
            reason: "must fall between the years 0000 and 9999",
        });
    }
    Ok(at)
}

/// Ids that are not integers cannot name a record.
fn parse_id(raw: &str) -> std::result::Result<RecordId, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found())
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": "Server is running"
    }))
}

/// List records with optional filters.
#[instrument(skip(service))]
pub async fn list_records(
    State(service): State<RecordService>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> std::result::Result<Json<ApiResponse<Vec<TemperatureRecord>>>, ApiError> {
    const CONTEXT: &str = "Error fetching temperature records";

    let Query(params) = params?;
    let query = params
        .into_query()
        .map_err(|err| ApiError::from_service(CONTEXT, err))?;
    let records = service
        .list(query)
        .await
        .map_err(|err| ApiError::from_service(CONTEXT, err))?;

    let count = records.len();
    Ok(Json(ApiResponse {
        count: Some(count),
        ..ApiResponse::data(records)
    }))
}

/// Fetch one record.
#[instrument(skip(service))]
pub async fn get_record(
    State(service): State<RecordService>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ApiResponse<TemperatureRecord>>, ApiError> {
    let id = parse_id(&id)?;
    let record = service
        .get(id)
        .await
        .map_err(|err| ApiError::from_service("Error fetching temperature record", err))?;

    Ok(Json(ApiResponse::data(record)))
}

/// Create a record.
#[instrument(skip(service, payload))]
pub async fn create_record(
    State(service): State<RecordService>,
    payload: std::result::Result<Json<CreateRecord>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<ApiResponse<TemperatureRecord>>), ApiError> {
    let Json(request) = payload?;
    let record = service
        .create(request)
        .await
        .map_err(|err| ApiError::from_service("Error creating temperature record", err))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Temperature record created successfully",
            record,
        )),
    ))
}

/// Partially update a record.
#[instrument(skip(service, payload))]
pub async fn update_record(
    State(service): State<RecordService>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateRecord>, JsonRejection>,
) -> std::result::Result<Json<ApiResponse<TemperatureRecord>>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let record = service
        .update(id, request)
        .await
        .map_err(|err| ApiError::from_service("Error updating temperature record", err))?;

    Ok(Json(ApiResponse::with_message(
        "Temperature record updated successfully",
        record,
    )))
}

/// Delete a record and return its last state.
#[instrument(skip(service))]
pub async fn delete_record(
    State(service): State<RecordService>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ApiResponse<TemperatureRecord>>, ApiError> {
    let id = parse_id(&id)?;
    let record = service
        .delete(id)
        .await
        .map_err(|err| ApiError::from_service("Error deleting temperature record", err))?;

    Ok(Json(ApiResponse::with_message(
        "Temperature record deleted successfully",
        record,
    )))
}

/// Aggregate counts.
#[instrument(skip(service))]
pub async fn summary(
    State(service): State<RecordService>,
) -> std::result::Result<Json<ApiResponse<RecordSummary>>, ApiError> {
    let summary = service
        .summary()
        .await
        .map_err(|err| ApiError::from_service("Error fetching temperature statistics", err))?;

    Ok(Json(ApiResponse::data(summary)))
}
