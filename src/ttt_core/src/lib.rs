//! TTT Core - pacing calculations for team time trials.
//!
//! Works out a target power band for the rider on the front and a turn
//! length for each rider from the team's power (and weight) figures.
//! Python bindings via PyO3 are behind the `python` feature.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod config;
pub mod constants;
pub mod error;
pub mod multiplier;
pub mod pacing;
pub mod rider;
pub mod riders;

pub use config::{EffortLevel, FormatSpec, Options, ReferenceMetric, RiderField};
pub use constants::{MAX_RIDERS, MIN_RIDERS, SAMPLE_STDDEV_CALIBRATION_FACTOR};
pub use error::{PacingError, Result};
pub use multiplier::{MultiplierSource, MultiplierTable, ScalarMultiplier};
pub use pacing::{
    average_turn_length, compute_pacing, format_power, format_rest_time, format_spec,
    rest_time, round_turn_length, rounded_turn_lengths, target_power_band, PacingReport,
    PacingSummary, PowerBandRow, TurnLengthRow,
};
pub use rider::Rider;
pub use riders::{Riders, Stats};

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Returns false if a global subscriber was already set.
pub fn init_logging() -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Full pacing report for a team.
///
/// Uses the multiplier table when given, otherwise the effort level's
/// fixed multiplier.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "compute_pacing", signature = (riders, options, table = None))]
fn py_compute_pacing(
    riders: &Riders,
    options: &Options,
    table: Option<&MultiplierTable>,
) -> PyResult<PacingReport> {
    let report = match table {
        Some(table) => compute_pacing(riders, options, table)?,
        None => compute_pacing(riders, options, &ScalarMultiplier)?,
    };
    Ok(report)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "format_power")]
fn py_format_power(value: f64, metric: ReferenceMetric) -> String {
    format_power(value, metric)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "round_turn_length")]
fn py_round_turn_length(raw: f64) -> PyResult<u32> {
    Ok(round_turn_length(raw)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "rest_time")]
fn py_rest_time(rounded: Vec<u32>) -> PyResult<f64> {
    Ok(rest_time(&rounded)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "format_rest_time")]
fn py_format_rest_time(seconds: f64) -> String {
    format_rest_time(seconds)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "init_logging")]
fn py_init_logging() -> bool {
    init_logging()
}

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn ttt_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Classes
    m.add_class::<Rider>()?;
    m.add_class::<Riders>()?;
    m.add_class::<Stats>()?;
    m.add_class::<Options>()?;
    m.add_class::<ReferenceMetric>()?;
    m.add_class::<EffortLevel>()?;
    m.add_class::<MultiplierTable>()?;
    m.add_class::<PowerBandRow>()?;
    m.add_class::<TurnLengthRow>()?;
    m.add_class::<PacingSummary>()?;
    m.add_class::<PacingReport>()?;

    // Functions
    m.add_function(wrap_pyfunction!(py_compute_pacing, m)?)?;
    m.add_function(wrap_pyfunction!(py_format_power, m)?)?;
    m.add_function(wrap_pyfunction!(py_round_turn_length, m)?)?;
    m.add_function(wrap_pyfunction!(py_rest_time, m)?)?;
    m.add_function(wrap_pyfunction!(py_format_rest_time, m)?)?;
    m.add_function(wrap_pyfunction!(py_init_logging, m)?)?;

    // Constants
    m.add("SAMPLE_STDDEV_CALIBRATION_FACTOR", SAMPLE_STDDEV_CALIBRATION_FACTOR)?;
    m.add("MIN_RIDERS", MIN_RIDERS)?;
    m.add("MAX_RIDERS", MAX_RIDERS)?;

    Ok(())
}
