#[cfg(feature = "python")]
use pyo3::prelude::*;
use std::fmt;

use crate::config::{ReferenceMetric, RiderField};
use crate::error::{PacingError, Result};

/// A single team member.
///
/// Only `number` is known when the rider is created; the input form fills in
/// the rest. `power` and `weight` count as unset when they are zero.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rider {
    /// Position in the team, starting at 0
    #[cfg_attr(feature = "python", pyo3(get))]
    pub number: usize,

    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub name: Option<String>,

    /// Body weight in kg
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub weight: Option<f64>,

    /// 40 minute power in watts
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub power: Option<u32>,
}

type Accessor = fn(&Rider) -> Result<f64>;
type Validator = fn(&Rider) -> Result<()>;

/// Typed accessor and validator registered for a field, if any.
struct FieldOps {
    value: Option<Accessor>,
    validate: Option<Validator>,
}

fn field_ops(field: RiderField) -> FieldOps {
    match field {
        RiderField::Name => FieldOps {
            value: None,
            validate: None,
        },
        RiderField::Power => FieldOps {
            value: Some(Rider::power_value),
            validate: Some(Rider::validate_power),
        },
        RiderField::Weight => FieldOps {
            value: Some(Rider::checked_weight),
            validate: Some(Rider::validate_weight),
        },
        RiderField::Wkg => FieldOps {
            value: Some(Rider::wkg),
            validate: None,
        },
    }
}

impl Rider {
    pub fn new(number: usize) -> Self {
        Rider {
            number,
            ..Rider::default()
        }
    }

    pub fn with_power(mut self, power: u32) -> Self {
        self.power = Some(power);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn checked_power(&self) -> Result<u32> {
        match self.power {
            Some(power) if power > 0 => Ok(power),
            _ => Err(self.invalid(RiderField::Power)),
        }
    }

    fn power_value(&self) -> Result<f64> {
        self.checked_power().map(f64::from)
    }

    fn checked_weight(&self) -> Result<f64> {
        match self.weight {
            Some(weight) if weight > 0.0 => Ok(weight),
            _ => Err(self.invalid(RiderField::Weight)),
        }
    }

    fn invalid(&self, field: RiderField) -> PacingError {
        PacingError::Validation {
            number: self.number,
            field,
        }
    }

    pub fn validate_power(&self) -> Result<()> {
        self.checked_power().map(|_| ())
    }

    pub fn validate_weight(&self) -> Result<()> {
        self.checked_weight().map(|_| ())
    }

    /// Watts per kilogram.
    pub fn wkg(&self) -> Result<f64> {
        let weight = self.checked_weight()?;
        let power = self.checked_power()?;
        Ok(f64::from(power) / weight)
    }

    /// Value used to compare this rider against the team.
    pub fn reference_value(&self, metric: ReferenceMetric) -> Result<f64> {
        match metric {
            ReferenceMetric::Power => self.power_value(),
            ReferenceMetric::Wkg => self.wkg(),
        }
    }

    /// Numeric value of `field`, failing if it is unset or non-positive.
    pub fn value(&self, field: RiderField) -> Result<f64> {
        let accessor = field_ops(field)
            .value
            .ok_or(PacingError::UnsupportedField(field))?;
        accessor(self)
    }

    /// Run the validator registered for `field`.
    pub fn validate(&self, field: RiderField) -> Result<()> {
        let validator = field_ops(field)
            .validate
            .ok_or(PacingError::UnsupportedField(field))?;
        validator(self)
    }

    /// Whether `field` holds something usable.
    pub fn has_data(&self, field: RiderField) -> bool {
        match field {
            RiderField::Name => self.name.as_deref().is_some_and(|n| !n.is_empty()),
            _ => self.value(field).is_ok(),
        }
    }

    /// Target turn length for this rider in seconds.
    ///
    /// `(reference / average_reference) ^ power_scale * target_turn_length`, so
    /// a rider exactly on the team average pulls for the target time.
    pub fn turn_length(
        &self,
        average_reference: f64,
        target_turn_length: u32,
        metric: ReferenceMetric,
        power_scale: f64,
    ) -> Result<f64> {
        let reference = self.reference_value(metric)?;
        if average_reference.is_nan() || average_reference <= 0.0 {
            return Err(PacingError::Computation(format!(
                "average {} must be positive, got {}",
                metric.field(),
                average_reference
            )));
        }
        Ok((reference / average_reference).powf(power_scale) * f64::from(target_turn_length))
    }
}

impl fmt::Display for Rider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rider {}: {} | {} W | {} kg",
            self.number + 1,
            self.name.as_deref().unwrap_or("-"),
            self.power.map_or_else(|| "-".to_string(), |p| p.to_string()),
            self.weight.map_or_else(|| "-".to_string(), |w| w.to_string()),
        )
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Rider {
    #[new]
    #[pyo3(signature = (number, name = None, power = None, weight = None))]
    fn py_new(number: usize, name: Option<String>, power: Option<u32>, weight: Option<f64>) -> Self {
        Rider {
            number,
            name,
            weight,
            power,
        }
    }

    #[pyo3(name = "wkg")]
    fn py_wkg(&self) -> PyResult<f64> {
        Ok(self.wkg()?)
    }

    #[pyo3(name = "reference_value")]
    fn py_reference_value(&self, metric: ReferenceMetric) -> PyResult<f64> {
        Ok(self.reference_value(metric)?)
    }

    #[pyo3(name = "turn_length")]
    fn py_turn_length(
        &self,
        average_reference: f64,
        target_turn_length: u32,
        metric: ReferenceMetric,
        power_scale: f64,
    ) -> PyResult<f64> {
        Ok(self.turn_length(average_reference, target_turn_length, metric, power_scale)?)
    }

    /// Validate a field by name, e.g. `"power"` or `"weight"`.
    #[pyo3(name = "validate")]
    fn py_validate(&self, field: &str) -> PyResult<()> {
        Ok(self.validate(field.parse()?)?)
    }

    fn __str__(&self) -> String {
        self.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "Rider(number={}, name={:?}, power={:?}, weight={:?})",
            self.number, self.name, self.power, self.weight
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rider_has_only_number() {
        let rider = Rider::new(4);
        assert_eq!(rider.number, 4);
        assert!(rider.name.is_none());
        assert!(rider.power.is_none());
        assert!(rider.weight.is_none());
    }

    #[test]
    fn test_wkg() {
        let rider = Rider::new(0).with_power(300).with_weight(75.0);
        assert!((rider.wkg().unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_wkg_requires_weight_and_power() {
        let no_weight = Rider::new(1).with_power(300);
        assert!(matches!(
            no_weight.wkg(),
            Err(PacingError::Validation { number: 1, field: RiderField::Weight })
        ));

        let zero_power = Rider::new(2).with_power(0).with_weight(70.0);
        assert!(matches!(
            zero_power.wkg(),
            Err(PacingError::Validation { number: 2, field: RiderField::Power })
        ));
    }

    #[test]
    fn test_reference_value_power_ignores_weight() {
        let rider = Rider::new(0).with_power(250);
        assert!((rider.reference_value(ReferenceMetric::Power).unwrap() - 250.0).abs() < 1e-12);
        assert!(rider.reference_value(ReferenceMetric::Wkg).is_err());
    }

    #[test]
    fn test_zero_and_unset_power_both_invalid() {
        for rider in [Rider::new(0), Rider::new(0).with_power(0)] {
            for metric in [ReferenceMetric::Power, ReferenceMetric::Wkg] {
                let rider = rider.clone().with_weight(70.0);
                assert!(matches!(
                    rider.reference_value(metric),
                    Err(PacingError::Validation { field: RiderField::Power, .. })
                ));
            }
        }
    }

    #[test]
    fn test_validate_dispatch() {
        let rider = Rider::new(3).with_power(200);
        assert!(rider.validate(RiderField::Power).is_ok());
        assert!(matches!(
            rider.validate(RiderField::Weight),
            Err(PacingError::Validation { number: 3, field: RiderField::Weight })
        ));
        assert!(matches!(
            rider.validate(RiderField::Name),
            Err(PacingError::UnsupportedField(RiderField::Name))
        ));
        assert!(matches!(
            rider.validate(RiderField::Wkg),
            Err(PacingError::UnsupportedField(RiderField::Wkg))
        ));
    }

    #[test]
    fn test_negative_weight_invalid() {
        let rider = Rider::new(0).with_power(200).with_weight(-1.0);
        assert!(rider.validate(RiderField::Weight).is_err());
    }

    #[test]
    fn test_value_and_has_data() {
        let rider = Rider::new(0).with_power(280).with_weight(70.0).with_name("Ana");
        assert!((rider.value(RiderField::Power).unwrap() - 280.0).abs() < 1e-12);
        assert!((rider.value(RiderField::Weight).unwrap() - 70.0).abs() < 1e-12);
        assert!((rider.value(RiderField::Wkg).unwrap() - 4.0).abs() < 1e-12);
        assert!(rider.value(RiderField::Name).is_err());
        assert!(rider.has_data(RiderField::Name));
        assert!(!Rider::new(1).with_name("").has_data(RiderField::Name));
        assert!(!Rider::new(1).with_power(0).has_data(RiderField::Power));
    }

    #[test]
    fn test_turn_length_on_average_is_target() {
        let rider = Rider::new(0).with_power(280);
        for scale in [0.5, 1.0, 3.0, 7.0] {
            let turn = rider.turn_length(280.0, 30, ReferenceMetric::Power, scale).unwrap();
            assert!((turn - 30.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_turn_length_formula() {
        let rider = Rider::new(0).with_power(300);
        let turn = rider.turn_length(280.0, 30, ReferenceMetric::Power, 3.0).unwrap();
        let expected = (300.0_f64 / 280.0).powi(3) * 30.0;
        assert!((turn - expected).abs() < 1e-9);
    }

    #[test]
    fn test_turn_length_zero_average() {
        let rider = Rider::new(0).with_power(300);
        assert!(matches!(
            rider.turn_length(0.0, 30, ReferenceMetric::Power, 3.0),
            Err(PacingError::Computation(_))
        ));
    }

    #[test]
    fn test_display_uses_one_based_number() {
        let rider = Rider::new(0).with_name("Ana").with_power(300);
        assert_eq!(rider.to_string(), "Rider 1: Ana | 300 W | - kg");
    }
}
