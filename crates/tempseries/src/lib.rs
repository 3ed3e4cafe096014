//! `tempseries` - An HTTP service for per-person temperature series
//!
//! Each record holds a person's name, a series of temperature samples and the
//! sample closest to zero (ties go to the positive value). Records live in
//! `SQLite` and are managed through [`RecordService`], which the [`api`]
//! module exposes over HTTP.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod record;
pub mod series;
pub mod service;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventPublisher, RecordEvent};
pub use logging::init_logging;
pub use record::{RecordId, RecordSummary, TemperatureRecord};
pub use series::{closest_to_zero, SeriesValidator, TemperatureSeries};
pub use service::{CreateRecord, ListQuery, RecordService, UpdateRecord};
pub use storage::{RecordStore, Storage};
