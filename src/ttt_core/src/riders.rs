#[cfg(feature = "python")]
use pyo3::prelude::*;
use statrs::statistics::Statistics;
use std::fmt;

use crate::config::{ReferenceMetric, RiderField};
use crate::constants::SAMPLE_STDDEV_CALIBRATION_FACTOR;
use crate::error::{PacingError, Result};
use crate::rider::Rider;

/// Aggregate statistics of one rider field across the team.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub average: f64,

    /// Sample standard deviation, already scaled by the calibration factor
    pub stddev: f64,

    /// `average - stddev`, the sustainable end of the effort band
    pub second_average: f64,
}

/// The team, ordered by rider number.
///
/// Rider `i` always sits at index `i`. The collection is rebuilt, never
/// reordered, when the team size changes.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Riders {
    riders: Vec<Rider>,
}

impl Riders {
    /// Create `count` empty riders numbered from 0.
    pub fn new(count: usize) -> Self {
        Riders {
            riders: (0..count).map(Rider::new).collect(),
        }
    }

    /// Adopt riders built elsewhere. Their numbers must run 0..N in order.
    pub fn from_riders(riders: Vec<Rider>) -> Result<Self> {
        if let Some((index, rider)) = riders.iter().enumerate().find(|(i, r)| r.number != *i) {
            return Err(PacingError::Configuration(format!(
                "rider at position {} has number {}",
                index, rider.number
            )));
        }
        Ok(Riders { riders })
    }

    pub fn len(&self) -> usize {
        self.riders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rider> {
        self.riders.iter()
    }

    pub fn get(&self, number: usize) -> Option<&Rider> {
        self.riders.get(number)
    }

    pub fn get_mut(&mut self, number: usize) -> Option<&mut Rider> {
        self.riders.get_mut(number)
    }

    /// Fill in the inputs for one rider.
    pub fn set_rider(
        &mut self,
        number: usize,
        name: Option<String>,
        power: Option<u32>,
        weight: Option<f64>,
    ) -> Result<()> {
        let count = self.riders.len();
        let rider = self.riders.get_mut(number).ok_or_else(|| {
            PacingError::Configuration(format!("no rider {} in a team of {}", number, count))
        })?;
        rider.name = name;
        rider.power = power;
        rider.weight = weight;
        Ok(())
    }

    /// Swap in a whole rider. It keeps its slot, so its number must match.
    pub fn replace_rider(&mut self, number: usize, rider: Rider) -> Result<()> {
        if rider.number != number {
            return Err(PacingError::Configuration(format!(
                "rider numbered {} cannot go in slot {}",
                rider.number, number
            )));
        }
        let count = self.riders.len();
        let slot = self.riders.get_mut(number).ok_or_else(|| {
            PacingError::Configuration(format!("no rider {} in a team of {}", number, count))
        })?;
        *slot = rider;
        Ok(())
    }

    /// Values of `field` for every rider, stopping at the first invalid one.
    pub fn values(&self, field: RiderField) -> Result<Vec<f64>> {
        self.riders.iter().map(|r| r.value(field)).collect()
    }

    pub fn average(&self, field: RiderField) -> Result<f64> {
        let values = self.values(field)?;
        if values.is_empty() {
            return Err(PacingError::Computation(format!(
                "cannot average {} over an empty team",
                field
            )));
        }
        Ok(values.iter().mean())
    }

    /// Sample standard deviation (N - 1 divisor) scaled by
    /// [`SAMPLE_STDDEV_CALIBRATION_FACTOR`].
    pub fn stddev(&self, field: RiderField) -> Result<f64> {
        let values = self.values(field)?;
        if values.len() < 2 {
            return Err(PacingError::Computation(format!(
                "sample standard deviation of {} needs at least 2 riders, got {}",
                field,
                values.len()
            )));
        }
        Ok(values.iter().std_dev() * SAMPLE_STDDEV_CALIBRATION_FACTOR)
    }

    pub fn second_average(&self, field: RiderField) -> Result<f64> {
        Ok(self.average(field)? - self.stddev(field)?)
    }

    pub fn stats(&self, field: RiderField) -> Result<Stats> {
        let average = self.average(field)?;
        let stddev = self.stddev(field)?;
        tracing::debug!(%field, average, stddev, "team stats");
        Ok(Stats {
            average,
            stddev,
            second_average: average - stddev,
        })
    }

    /// Validate `field` on every rider; the first failure is returned.
    pub fn validate(&self, field: RiderField) -> Result<()> {
        self.riders.iter().try_for_each(|r| r.validate(field)).inspect_err(|e| {
            tracing::warn!(%field, error = %e, "rider validation failed");
        })
    }

    pub fn riders_with_data(&self, field: RiderField) -> Vec<&Rider> {
        self.riders.iter().filter(|r| r.has_data(field)).collect()
    }

    /// Raw turn length for each rider, in rider number order.
    pub fn turn_lengths(
        &self,
        metric: ReferenceMetric,
        target_turn_length: u32,
        power_scale: f64,
    ) -> Result<Vec<f64>> {
        let average = self.average(metric.field())?;
        self.riders
            .iter()
            .map(|r| r.turn_length(average, target_turn_length, metric, power_scale))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Riders {
    type Item = &'a Rider;
    type IntoIter = std::slice::Iter<'a, Rider>;

    fn into_iter(self) -> Self::IntoIter {
        self.riders.iter()
    }
}

impl fmt::Display for Riders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Riders:")?;
        for rider in &self.riders {
            write!(f, "\n\t{}", rider)?;
        }
        Ok(())
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Stats {
    fn __repr__(&self) -> String {
        format!(
            "Stats(average={:.2}, stddev={:.2}, second_average={:.2})",
            self.average, self.stddev, self.second_average
        )
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Riders {
    #[new]
    fn py_new(count: usize) -> Self {
        Riders::new(count)
    }

    /// Copies of the riders, in number order.
    ///
    /// Editing a returned rider does not change the team; write inputs back
    /// with `set_rider` or `team[number] = rider`.
    #[getter]
    fn riders(&self) -> Vec<Rider> {
        self.riders.clone()
    }

    #[pyo3(name = "set_rider", signature = (number, name = None, power = None, weight = None))]
    fn py_set_rider(
        &mut self,
        number: usize,
        name: Option<String>,
        power: Option<u32>,
        weight: Option<f64>,
    ) -> PyResult<()> {
        Ok(self.set_rider(number, name, power, weight)?)
    }

    #[pyo3(name = "average")]
    fn py_average(&self, field: &str) -> PyResult<f64> {
        Ok(self.average(field.parse()?)?)
    }

    #[pyo3(name = "stddev")]
    fn py_stddev(&self, field: &str) -> PyResult<f64> {
        Ok(self.stddev(field.parse()?)?)
    }

    #[pyo3(name = "second_average")]
    fn py_second_average(&self, field: &str) -> PyResult<f64> {
        Ok(self.second_average(field.parse()?)?)
    }

    #[pyo3(name = "stats")]
    fn py_stats(&self, field: &str) -> PyResult<Stats> {
        Ok(self.stats(field.parse()?)?)
    }

    #[pyo3(name = "validate")]
    fn py_validate(&self, field: &str) -> PyResult<()> {
        Ok(self.validate(field.parse()?)?)
    }

    #[pyo3(name = "riders_with_data")]
    fn py_riders_with_data(&self, field: &str) -> PyResult<Vec<Rider>> {
        let field: RiderField = field.parse()?;
        Ok(self.riders_with_data(field).into_iter().cloned().collect())
    }

    #[pyo3(name = "turn_lengths")]
    fn py_turn_lengths(
        &self,
        metric: ReferenceMetric,
        target_turn_length: u32,
        power_scale: f64,
    ) -> PyResult<Vec<f64>> {
        Ok(self.turn_lengths(metric, target_turn_length, power_scale)?)
    }

    fn __len__(&self) -> usize {
        self.len()
    }

    /// A copy of rider `number`; see `riders` for how to write changes back.
    fn __getitem__(&self, number: usize) -> PyResult<Rider> {
        self.get(number)
            .cloned()
            .ok_or_else(|| pyo3::exceptions::PyIndexError::new_err(format!("no rider {}", number)))
    }

    fn __setitem__(&mut self, number: usize, rider: Rider) -> PyResult<()> {
        Ok(self.replace_rider(number, rider)?)
    }

    fn __str__(&self) -> String {
        self.to_string()
    }
}
