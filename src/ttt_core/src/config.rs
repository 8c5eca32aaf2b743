#[cfg(feature = "python")]
use pyo3::prelude::*;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_REFERENCE_POWER_SCALE, DEFAULT_RIDERS, DEFAULT_TARGET_TURN_LENGTH,
    EFFORT_MULTIPLIERS, MAX_RIDERS, MIN_RIDERS,
};
use crate::error::{PacingError, Result};

/// Quantity used to compare riders' relative strength.
///
/// Flat courses are ridden on raw watts, hilly ones on watts per kilogram.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReferenceMetric {
    #[default]
    Power,
    Wkg,
}

impl ReferenceMetric {
    /// Rider field this metric reads.
    pub fn field(self) -> RiderField {
        match self {
            ReferenceMetric::Power => RiderField::Power,
            ReferenceMetric::Wkg => RiderField::Wkg,
        }
    }

    /// How values in this metric are rounded and labelled for display.
    pub fn format_spec(self) -> FormatSpec {
        match self {
            ReferenceMetric::Power => FormatSpec {
                decimals: 0,
                unit: "Watts",
            },
            ReferenceMetric::Wkg => FormatSpec {
                decimals: 1,
                unit: "W/kg",
            },
        }
    }
}

/// Display rule for a reference metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatSpec {
    pub decimals: usize,
    pub unit: &'static str,
}

/// How hard the team wants to go (the "pleasure index").
///
/// Each level carries its key into the multiplier table, a label and the
/// scalar multiplier used when no table is loaded.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffortLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl EffortLevel {
    pub const ALL: [EffortLevel; 3] = [EffortLevel::Easy, EffortLevel::Medium, EffortLevel::Hard];

    /// Column key in the multiplier table.
    pub fn key(self) -> u8 {
        match self {
            EffortLevel::Easy => 1,
            EffortLevel::Medium => 2,
            EffortLevel::Hard => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffortLevel::Easy => "Take it easy",
            EffortLevel::Medium => "Go on then",
            EffortLevel::Hard => "Come at me bro",
        }
    }

    pub fn multiplier(self) -> f64 {
        EFFORT_MULTIPLIERS[usize::from(self.key() - 1)]
    }

    pub fn from_key(key: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.key() == key)
            .ok_or_else(|| PacingError::Configuration(format!("no effort level with key {}", key)))
    }
}

impl fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key(), self.label())
    }
}

/// Selects a rider attribute by name without reflection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RiderField {
    Name,
    Power,
    Weight,
    Wkg,
}

impl RiderField {
    pub fn as_str(self) -> &'static str {
        match self {
            RiderField::Name => "name",
            RiderField::Power => "power",
            RiderField::Weight => "weight",
            RiderField::Wkg => "wkg",
        }
    }
}

impl fmt::Display for RiderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiderField {
    type Err = PacingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(RiderField::Name),
            "power" => Ok(RiderField::Power),
            "weight" => Ok(RiderField::Weight),
            "wkg" => Ok(RiderField::Wkg),
            other => Err(PacingError::UnknownField(other.to_string())),
        }
    }
}

/// Run parameters for one pacing computation.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub riders: usize,

    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub reference_metric: ReferenceMetric,

    /// Average pull duration the team wants to sustain, in seconds
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub target_turn_length: u32,

    /// Exponent applied to a rider's reference value relative to the team average
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub reference_power_scale: f64,

    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub effort: EffortLevel,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            riders: DEFAULT_RIDERS,
            reference_metric: ReferenceMetric::Power,
            target_turn_length: DEFAULT_TARGET_TURN_LENGTH,
            reference_power_scale: DEFAULT_REFERENCE_POWER_SCALE,
            effort: EffortLevel::Medium,
        }
    }
}

impl Options {
    /// Check the ranges the input form normally enforces.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RIDERS..=MAX_RIDERS).contains(&self.riders) {
            return Err(PacingError::Configuration(format!(
                "riders must be between {} and {}, got {}",
                MIN_RIDERS, MAX_RIDERS, self.riders
            )));
        }
        self.validate_pacing()
    }

    /// Check the parameters the pacing formulas depend on.
    pub fn validate_pacing(&self) -> Result<()> {
        if self.target_turn_length == 0 {
            return Err(PacingError::Configuration(
                "target turn length must be at least 1 second".to_string(),
            ));
        }
        if !(self.reference_power_scale.is_finite() && self.reference_power_scale > 0.0) {
            return Err(PacingError::Configuration(format!(
                "reference power scale must be positive, got {}",
                self.reference_power_scale
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl ReferenceMetric {
    /// Decimal places used when displaying values in this metric
    #[getter]
    fn decimals(&self) -> usize {
        self.format_spec().decimals
    }

    #[getter]
    fn unit(&self) -> &'static str {
        self.format_spec().unit
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl EffortLevel {
    #[getter(key)]
    fn py_key(&self) -> u8 {
        self.key()
    }

    #[getter(label)]
    fn py_label(&self) -> &'static str {
        self.label()
    }

    #[getter(multiplier)]
    fn py_multiplier(&self) -> f64 {
        self.multiplier()
    }

    fn __str__(&self) -> String {
        self.to_string()
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Options {
    #[new]
    #[pyo3(signature = (
        riders = DEFAULT_RIDERS,
        reference_metric = ReferenceMetric::Power,
        target_turn_length = DEFAULT_TARGET_TURN_LENGTH,
        reference_power_scale = DEFAULT_REFERENCE_POWER_SCALE,
        effort = EffortLevel::Medium,
    ))]
    fn py_new(
        riders: usize,
        reference_metric: ReferenceMetric,
        target_turn_length: u32,
        reference_power_scale: f64,
        effort: EffortLevel,
    ) -> Self {
        Options {
            riders,
            reference_metric,
            target_turn_length,
            reference_power_scale,
            effort,
        }
    }

    #[pyo3(name = "validate")]
    fn py_validate(&self) -> PyResult<()> {
        Ok(self.validate()?)
    }

    fn __repr__(&self) -> String {
        format!(
            "Options(riders={}, reference_metric={:?}, target_turn_length={}, reference_power_scale={}, effort={:?})",
            self.riders,
            self.reference_metric,
            self.target_turn_length,
            self.reference_power_scale,
            self.effort
        )
    }
}
