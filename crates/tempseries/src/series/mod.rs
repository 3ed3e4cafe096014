//! Temperature series types and the rules applied to them.
//!
//! A [`TemperatureSeries`] can only be obtained through validation, so holding
//! one means the samples are non-empty and finite. A [`DerivedSeries`] pairs a
//! series with its closest-to-zero value; storage only ever receives series in
//! that form, which keeps the two columns in sync.

mod selector;
mod validator;

pub use selector::closest_to_zero;
pub use validator::{validate, SeriesValidator, ValueRange};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An ordered, non-empty sequence of finite temperature samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct TemperatureSeries(Vec<f64>);

impl TemperatureSeries {
    /// Create a series from typed values, without a range bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeries`] if `values` is empty or contains a
    /// non-finite value.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        validator::check_well_formed(&values)?;
        Ok(Self(values))
    }

    /// Wrap values that already passed [`validator::check_well_formed`].
    fn from_checked(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// The samples, in their original order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of samples (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as the JSON text stored in the database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Decode the JSON text stored in the database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed text, or [`Error::InvalidSeries`]
    /// if the decoded values break the series invariants.
    pub fn from_json(text: &str) -> Result<Self> {
        let values: Vec<f64> = serde_json::from_str(text)?;
        Self::new(values)
    }
}

impl TryFrom<Vec<f64>> for TemperatureSeries {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<TemperatureSeries> for Vec<f64> {
    fn from(series: TemperatureSeries) -> Self {
        series.0
    }
}

/// A validated series together with its closest-to-zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    series: TemperatureSeries,
    closest_to_zero: f64,
}

impl DerivedSeries {
    /// Run the selector over `series`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySeries`] if the selector finds no values, which
    /// a validated series never triggers.
    pub fn derive(series: TemperatureSeries) -> Result<Self> {
        let closest_to_zero = closest_to_zero(series.values())?;
        Ok(Self {
            series,
            closest_to_zero,
        })
    }

    /// The underlying series.
    #[must_use]
    pub fn series(&self) -> &TemperatureSeries {
        &self.series
    }

    /// The derived closest-to-zero value.
    #[must_use]
    pub fn closest_to_zero(&self) -> f64 {
        self.closest_to_zero
    }
}
