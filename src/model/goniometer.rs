//! Goniometer model

use super::{normalize, ModelError, Validate};
use serde::Serialize;

const IDENTITY: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Single-axis goniometer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goniometer {
    /// Unit rotation axis in the laboratory frame
    pub rotation_axis: [f64; 3],
    /// Fixed rotation applied before the scan rotation, row-major
    pub fixed_rotation: [f64; 9],
}

/// Goniometer rotating about a known axis with no fixed rotation.
pub fn known_axis(axis: [f64; 3]) -> Result<Goniometer, ModelError> {
    Ok(Goniometer {
        rotation_axis: normalize("goniometer", axis)?,
        fixed_rotation: IDENTITY,
    })
}

impl Validate for Goniometer {
    fn validate(&self) -> Result<(), ModelError> {
        normalize("goniometer", self.rotation_axis)?;
        if self.fixed_rotation.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::invalid(
                "goniometer",
                "fixed rotation has non-finite elements",
            ));
        }
        Ok(())
    }
}
