//! Experiment description models
//!
//! Small value types built from image headers by the format readers. The
//! registry and lifecycle code never interpret their contents; they only ask
//! each model to [`Validate`] itself before storing it.

pub mod beam;
pub mod cube;
pub mod detector;
pub mod goniometer;
pub mod scan;

pub use beam::Beam;
pub use cube::Cube;
pub use detector::{Detector, Panel};
pub use goniometer::Goniometer;
pub use scan::Scan;

use thiserror::Error;

/// Errors raised by model factories and validation
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid {model}: {reason}")]
    Invalid { model: &'static str, reason: String },
}

impl ModelError {
    pub fn invalid(model: &'static str, reason: impl Into<String>) -> Self {
        ModelError::Invalid {
            model,
            reason: reason.into(),
        }
    }
}

/// Consistency check applied to every model before it is stored
pub trait Validate {
    fn validate(&self) -> Result<(), ModelError>;
}

pub(crate) fn length(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub(crate) fn normalize(model: &'static str, v: [f64; 3]) -> Result<[f64; 3], ModelError> {
    let len = length(&v);
    if !len.is_finite() || len == 0.0 {
        return Err(ModelError::invalid(model, "zero-length direction vector"));
    }
    Ok([v[0] / len, v[1] / len, v[2] / len])
}
