//! End-to-end record lifecycle against `SQLite`.

#![allow(clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use tempseries::config::ListingConfig;
use tempseries::{
    CreateRecord, Error, EventPublisher, ListQuery, RecordEvent, RecordService, SeriesValidator,
    Storage, UpdateRecord,
};

fn service_over(storage: Storage) -> RecordService {
    RecordService::new(
        Arc::new(storage),
        SeriesValidator::new(),
        ListingConfig::default(),
        Some(EventPublisher::new(32)),
    )
}

fn in_memory_service() -> RecordService {
    service_over(Storage::open_in_memory().expect("in-memory storage"))
}

fn create(name: &str, series: Value) -> CreateRecord {
    CreateRecord {
        person_name: Some(json!(name)),
        temperature_series: Some(series),
    }
}

/// Let the clock move past the microsecond precision of stored timestamps.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test]
async fn create_returns_record_with_derived_value() {
    let service = in_memory_service();

    let record = service
        .create(create("Test User", json!([36.8, 37.1, 36.9])))
        .await
        .unwrap();

    assert!(record.id > 0);
    assert_eq!(record.person_name, "Test User");
    assert_eq!(record.temperature_series.values(), &[36.8, 37.1, 36.9]);
    assert_eq!(record.closest_to_zero, 36.8);
    assert_eq!(service.get(record.id).await.unwrap(), record);
}

#[tokio::test]
async fn invalid_create_writes_nothing() {
    let service = in_memory_service();

    let err = service.create(create("", json!([]))).await.unwrap_err();

    assert!(err.is_client_error());
    assert_eq!(service.summary().await.unwrap().total_records, 0);
}

#[tokio::test]
async fn series_update_resolves_tie_to_positive() {
    let service = in_memory_service();
    let original = service
        .create(create("Tie Breaker", json!([36.8])))
        .await
        .unwrap();
    tick().await;

    let updated = service
        .update(
            original.id,
            UpdateRecord {
                person_name: None,
                temperature_series: Some(json!([10, -2, 2])),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.closest_to_zero, 2.0);
    assert_eq!(updated.temperature_series.values(), &[10.0, -2.0, 2.0]);
    assert_eq!(updated.person_name, "Tie Breaker");
    assert!(updated.updated_at > original.updated_at);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.recorded_at, original.recorded_at);
}

#[tokio::test]
async fn delete_returns_snapshot_then_record_is_gone() {
    let service = in_memory_service();
    let record = service
        .create(create("Short Lived", json!([1.5, -0.5])))
        .await
        .unwrap();

    let snapshot = service.delete(record.id).await.unwrap();
    assert_eq!(snapshot, record);

    let err = service.get(record.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { id } if id == record.id));
}

#[tokio::test]
async fn empty_update_is_rejected_without_touching_record() {
    let service = in_memory_service();
    let record = service
        .create(create("Unchanged", json!([3.0])))
        .await
        .unwrap();
    tick().await;

    let err = service
        .update(record.id, UpdateRecord::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoOpUpdate));
    let reloaded = service.get(record.id).await.unwrap();
    assert_eq!(reloaded.updated_at, record.updated_at);
}

#[tokio::test]
async fn updated_at_never_precedes_created_at() {
    let service = in_memory_service();
    let record = service.create(create("Clock", json!([1.0]))).await.unwrap();

    let updated = service
        .update(
            record.id,
            UpdateRecord {
                person_name: Some(json!("Clock Two")),
                temperature_series: None,
            },
        )
        .await
        .unwrap();

    assert!(updated.updated_at >= updated.created_at);
    assert!(updated.updated_at >= record.updated_at);
}

#[tokio::test]
async fn summary_counts_records_and_people() {
    let service = in_memory_service();
    assert_eq!(service.summary().await.unwrap().total_records, 0);

    for (name, series) in [
        ("Alice", json!([36.6])),
        ("Alice", json!([37.0])),
        ("Bob", json!([36.9])),
    ] {
        service.create(create(name, series)).await.unwrap();
    }

    let summary = service.summary().await.unwrap();
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.unique_people_count, 2);
}

#[tokio::test]
async fn list_filters_by_name_and_orders_newest_first() {
    let service = in_memory_service();
    let first = service
        .create(create("Alice Smith", json!([1.0])))
        .await
        .unwrap();
    tick().await;
    service.create(create("Bob", json!([2.0]))).await.unwrap();
    tick().await;
    let third = service
        .create(create("alice jones", json!([3.0])))
        .await
        .unwrap();

    let all = service.list(ListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, third.id);

    let alices = service
        .list(ListQuery {
            person_name: Some("ALICE".to_string()),
            ..ListQuery::default()
        })
        .await
        .unwrap();
    let ids: Vec<_> = alices.iter().map(|record| record.id).collect();
    assert_eq!(ids, [third.id, first.id]);
}

#[tokio::test]
async fn list_filters_by_recorded_range() {
    let service = in_memory_service();
    let early = service.create(create("Early", json!([1.0]))).await.unwrap();
    tick().await;
    let late = service.create(create("Late", json!([2.0]))).await.unwrap();

    let from_late = service
        .list(ListQuery {
            recorded_from: Some(late.recorded_at),
            ..ListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(from_late.len(), 1);
    assert_eq!(from_late[0].id, late.id);

    let until_early = service
        .list(ListQuery {
            recorded_until: Some(early.recorded_at),
            ..ListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(until_early.len(), 1);
    assert_eq!(until_early[0].id, early.id);
}

#[tokio::test]
async fn series_round_trips_exactly_through_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("temperature.db");
    let values = [36.6, -0.1, 1e-10, 98.123_456_789_012_34, -273.15, 0.1 + 0.2];

    let id = {
        let service = service_over(Storage::open(&path).unwrap());
        service
            .create(create("Precise", json!(values)))
            .await
            .unwrap()
            .id
    };

    let reopened = service_over(Storage::open(&path).unwrap());
    let record = reopened.get(id).await.unwrap();
    assert_eq!(record.temperature_series.values(), &values);
    assert_eq!(record.closest_to_zero, 1e-10);
}

#[tokio::test]
async fn deleted_ids_are_not_reused() {
    let service = in_memory_service();
    let first = service.create(create("One", json!([1.0]))).await.unwrap();
    service.delete(first.id).await.unwrap();

    let second = service.create(create("Two", json!([2.0]))).await.unwrap();
    assert!(second.id > first.id);
}

#[tokio::test]
async fn subscribers_see_committed_changes_in_order() {
    let service = in_memory_service();
    let mut events = service.events().unwrap().subscribe();

    let record = service.create(create("Watched", json!([4.0]))).await.unwrap();
    service
        .update(
            record.id,
            UpdateRecord {
                person_name: None,
                temperature_series: Some(json!([-4.0, 4.0])),
            },
        )
        .await
        .unwrap();
    service.delete(record.id).await.unwrap();

    assert!(matches!(events.recv().await.unwrap(), RecordEvent::Created { id, .. } if id == record.id));
    assert!(matches!(events.recv().await.unwrap(), RecordEvent::Updated { id, .. } if id == record.id));
    assert!(matches!(events.recv().await.unwrap(), RecordEvent::Deleted { id, .. } if id == record.id));
}
