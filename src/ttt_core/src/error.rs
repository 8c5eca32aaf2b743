use thiserror::Error;

use crate::config::RiderField;

/// Everything that can stop a pacing computation.
///
/// None of these are recoverable inside the engine: the caller fixes the
/// input or configuration and runs the computation again.
#[derive(Error, Debug)]
pub enum PacingError {
    /// A rider is missing a value (or has a non-positive one) that the
    /// computation needs.
    #[error("rider {number}: {field} not set")]
    Validation { number: usize, field: RiderField },

    #[error("no validator or accessor for rider field `{0}`")]
    UnsupportedField(RiderField),

    #[error("unknown rider field `{0}`")]
    UnknownField(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("computation error: {0}")]
    Computation(String),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("multiplier table error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PacingError>;

#[cfg(feature = "python")]
impl From<PacingError> for pyo3::PyErr {
    fn from(err: PacingError) -> Self {
        use pyo3::exceptions::{
            PyArithmeticError, PyIOError, PyKeyError, PyNotImplementedError, PyValueError,
        };

        let msg = err.to_string();
        match err {
            PacingError::Validation { .. } => PyValueError::new_err(msg),
            PacingError::UnsupportedField(_) => PyNotImplementedError::new_err(msg),
            PacingError::UnknownField(_) | PacingError::Configuration(_) => {
                PyKeyError::new_err(msg)
            }
            PacingError::Computation(_) => PyArithmeticError::new_err(msg),
            PacingError::Io(e) => PyIOError::new_err(format!("{}: {}", msg, e)),
            PacingError::Csv(_) => PyValueError::new_err(msg),
        }
    }
}
