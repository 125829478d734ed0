//! Detector model
//!
//! A detector is a list of flat panels. Panel geometry follows the usual
//! convention: `origin` is the laboratory position (mm) of the first pixel
//! corner, `fast_axis` and `slow_axis` are unit vectors along pixel rows and
//! columns.

use super::{length, ModelError, Validate};
use serde::Serialize;

/// Direction of the beam towards the detector, used to place the panel.
const BEAM_TO_DETECTOR: [f64; 3] = [0.0, 0.0, -1.0];

/// A single flat detector panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub name: String,
    pub sensor: String,
    pub origin: [f64; 3],
    pub fast_axis: [f64; 3],
    pub slow_axis: [f64; 3],
    /// Pixel size (fast, slow) in mm
    pub pixel_size: (f64, f64),
    /// Image size (fast, slow) in pixels
    pub image_size: (usize, usize),
    /// Inclusive range of trusted pixel values
    pub trusted_range: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detector {
    pub panels: Vec<Panel>,
}

impl Detector {
    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }
}

/// Parse a direction token such as `+x` or `-y` into a unit vector.
fn axis_from_token(token: &str) -> Result<[f64; 3], ModelError> {
    let (sign, axis) = match token.as_bytes() {
        [b'+', axis] => (1.0, *axis),
        [b'-', axis] => (-1.0, *axis),
        _ => {
            return Err(ModelError::invalid(
                "detector",
                format!("unrecognised axis direction '{}'", token),
            ))
        }
    };

    match axis.to_ascii_lowercase() {
        b'x' => Ok([sign, 0.0, 0.0]),
        b'y' => Ok([0.0, sign, 0.0]),
        b'z' => Ok([0.0, 0.0, sign]),
        _ => Err(ModelError::invalid(
            "detector",
            format!("unrecognised axis direction '{}'", token),
        )),
    }
}

/// Single-panel detector perpendicular to the beam.
///
/// `beam_centre` is given in mm along the fast and slow directions, measured
/// from the first pixel corner.
#[allow(clippy::too_many_arguments)]
pub fn simple(
    sensor: &str,
    distance: f64,
    beam_centre: (f64, f64),
    fast_direction: &str,
    slow_direction: &str,
    pixel_size: (f64, f64),
    image_size: (usize, usize),
    trusted_range: (f64, f64),
) -> Result<Detector, ModelError> {
    let fast_axis = axis_from_token(fast_direction)?;
    let slow_axis = axis_from_token(slow_direction)?;

    let origin = [0, 1, 2].map(|i| {
        -beam_centre.0 * fast_axis[i] - beam_centre.1 * slow_axis[i]
            + distance * BEAM_TO_DETECTOR[i]
    });

    let detector = Detector {
        panels: vec![Panel {
            name: "Panel".to_string(),
            sensor: sensor.to_string(),
            origin,
            fast_axis,
            slow_axis,
            pixel_size,
            image_size,
            trusted_range,
        }],
    };
    detector.validate()?;
    Ok(detector)
}

impl Validate for Panel {
    fn validate(&self) -> Result<(), ModelError> {
        if self.pixel_size.0 <= 0.0 || self.pixel_size.1 <= 0.0 {
            return Err(ModelError::invalid(
                "detector",
                format!("panel '{}' has non-positive pixel size", self.name),
            ));
        }
        if self.image_size.0 == 0 || self.image_size.1 == 0 {
            return Err(ModelError::invalid(
                "detector",
                format!("panel '{}' has an empty image", self.name),
            ));
        }
        if self.trusted_range.0 >= self.trusted_range.1 {
            return Err(ModelError::invalid(
                "detector",
                format!("panel '{}' has an empty trusted range", self.name),
            ));
        }

        let dot: f64 = (0..3).map(|i| self.fast_axis[i] * self.slow_axis[i]).sum();
        if (length(&self.fast_axis) - 1.0).abs() > 1e-6
            || (length(&self.slow_axis) - 1.0).abs() > 1e-6
            || dot.abs() > 1e-6
        {
            return Err(ModelError::invalid(
                "detector",
                format!("panel '{}' axes are not orthonormal", self.name),
            ));
        }
        Ok(())
    }
}

impl Validate for Detector {
    fn validate(&self) -> Result<(), ModelError> {
        if self.panels.is_empty() {
            return Err(ModelError::invalid("detector", "no panels"));
        }
        self.panels.iter().try_for_each(Validate::validate)
    }
}
