//! Beam model

use super::{normalize, ModelError, Validate};
use serde::Serialize;

/// Direction of travel used when a header does not give one.
const DEFAULT_DIRECTION: [f64; 3] = [0.0, 0.0, 1.0];

/// Monochromatic beam
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Beam {
    /// Unit vector pointing from the sample towards the source
    pub direction: [f64; 3],
    /// Wavelength in Angstrom
    pub wavelength: f64,
}

/// Beam along the default direction with the given wavelength.
pub fn simple(wavelength: f64) -> Result<Beam, ModelError> {
    let beam = Beam {
        direction: DEFAULT_DIRECTION,
        wavelength,
    };
    beam.validate()?;
    Ok(beam)
}

/// Beam with an explicit direction.
pub fn simple_directional(direction: [f64; 3], wavelength: f64) -> Result<Beam, ModelError> {
    let beam = Beam {
        direction: normalize("beam", direction)?,
        wavelength,
    };
    beam.validate()?;
    Ok(beam)
}

impl Validate for Beam {
    fn validate(&self) -> Result<(), ModelError> {
        if !self.wavelength.is_finite() || self.wavelength <= 0.0 {
            return Err(ModelError::invalid(
                "beam",
                format!("wavelength must be positive, got {}", self.wavelength),
            ));
        }
        normalize("beam", self.direction)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_beam() {
        let beam = simple(1.0).unwrap();
        assert_eq!(beam.direction, DEFAULT_DIRECTION);
        assert_eq!(beam.wavelength, 1.0);
    }

    #[test]
    fn test_rejects_non_positive_wavelength() {
        assert!(simple(0.0).is_err());
        assert!(simple(-1.2).is_err());
        assert!(simple(f64::NAN).is_err());
    }

    #[test]
    fn test_directional_beam_is_normalized() {
        let beam = simple_directional([0.0, 0.0, 5.0], 0.9).unwrap();
        assert_eq!(beam.direction, [0.0, 0.0, 1.0]);
    }
}
