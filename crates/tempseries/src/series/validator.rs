//! Temperature series validation.
//!
//! Inbound series arrive as raw JSON so that shape errors (not an array,
//! a string where a number belongs) can be reported precisely. Magnitude is
//! unbounded unless a [`ValueRange`] is configured.

use serde_json::Value;

use crate::config::ValidationConfig;
use crate::error::{Error, Result};

use super::TemperatureSeries;

/// Inclusive bounds every sample must fall within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
}

impl ValueRange {
    /// Check whether `value` lies within the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Validates temperature series before they are accepted.
///
/// The default validator enforces shape and finiteness only. Range checking
/// is opt-in via [`SeriesValidator::with_range`] or the `validation` config
/// section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesValidator {
    range: Option<ValueRange>,
}

impl SeriesValidator {
    /// Create a validator with no magnitude bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator that also rejects values outside `[min, max]`.
    #[must_use]
    pub fn with_range(min: f64, max: f64) -> Self {
        Self {
            range: Some(ValueRange { min, max }),
        }
    }

    /// Build a validator from the `validation` config section.
    #[must_use]
    pub fn from_config(config: &ValidationConfig) -> Self {
        if config.enforce_range {
            Self::with_range(config.min_value, config.max_value)
        } else {
            Self::new()
        }
    }

    /// The enforced range, if any.
    #[must_use]
    pub fn range(&self) -> Option<ValueRange> {
        self.range
    }

    /// Validate a raw JSON series.
    ///
    /// Reports the first violation in input order, with 0-based indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeries`] if the input is not an array, is
    /// empty, contains a non-numeric or non-finite element, or (when a range
    /// is configured) contains a value outside the range.
    pub fn validate(&self, input: &Value) -> Result<TemperatureSeries> {
        let items = input
            .as_array()
            .ok_or_else(|| Error::invalid_series("not an array"))?;
        if items.is_empty() {
            return Err(Error::invalid_series("empty series"));
        }

        let values = items
            .iter()
            .enumerate()
            .map(|(index, item)| self.check_value(index, item.as_f64()))
            .collect::<Result<Vec<_>>>()?;

        Ok(TemperatureSeries::from_checked(values))
    }

    /// Validate already-typed values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeries`] on the same conditions as
    /// [`SeriesValidator::validate`], minus the shape checks.
    pub fn validate_values(&self, values: Vec<f64>) -> Result<TemperatureSeries> {
        self.check_all(&values)?;
        Ok(TemperatureSeries::from_checked(values))
    }

    fn check_all(&self, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(Error::invalid_series("empty series"));
        }
        for (index, &value) in values.iter().enumerate() {
            self.check_value(index, Some(value))?;
        }
        Ok(())
    }

    /// All checks for one element, so the earliest bad index wins whatever
    /// the kind of violation.
    fn check_value(&self, index: usize, value: Option<f64>) -> Result<f64> {
        let value = value
            .filter(|value| value.is_finite())
            .ok_or_else(|| Error::invalid_series(format!("invalid value at index {index}")))?;

        match self.range {
            Some(range) if !range.contains(value) => Err(Error::invalid_series(format!(
                "value {value} at index {index} is outside [{}, {}]",
                range.min, range.max
            ))),
            _ => Ok(value),
        }
    }
}

/// Validate a raw JSON series with no range bound.
///
/// # Errors
///
/// See [`SeriesValidator::validate`].
pub fn validate(input: &Value) -> Result<TemperatureSeries> {
    SeriesValidator::new().validate(input)
}

/// Non-empty and every element finite.
pub(crate) fn check_well_formed(values: &[f64]) -> Result<()> {
    SeriesValidator::new().check_all(values)
}
