//! Scan model

use super::{ModelError, Validate};
use serde::Serialize;

/// A rotation scan over a contiguous range of images
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scan {
    /// Inclusive, 1-based image range
    pub image_range: (usize, usize),
    /// Start angle and width of each oscillation, in degrees
    pub oscillation: (f64, f64),
    pub exposure_times: Vec<f64>,
    pub epochs: Vec<f64>,
}

impl Scan {
    pub fn num_images(&self) -> usize {
        self.image_range.1 + 1 - self.image_range.0
    }

    /// Rotation angle range covered by the scan, in degrees.
    pub fn oscillation_range(&self) -> (f64, f64) {
        let (start, width) = self.oscillation;
        (start, start + width * self.num_images() as f64)
    }
}

/// Build a scan, broadcasting a single exposure time over every image.
///
/// Angles are converted to degrees when `deg` is false.
pub fn make_scan(
    image_range: (usize, usize),
    exposure_time: f64,
    oscillation: (f64, f64),
    epochs: Vec<f64>,
    deg: bool,
) -> Result<Scan, ModelError> {
    if image_range.0 == 0 || image_range.1 < image_range.0 {
        return Err(ModelError::invalid(
            "scan",
            format!("invalid image range {:?}", image_range),
        ));
    }

    let oscillation = if deg {
        oscillation
    } else {
        (oscillation.0.to_degrees(), oscillation.1.to_degrees())
    };

    let num_images = image_range.1 + 1 - image_range.0;
    let scan = Scan {
        image_range,
        oscillation,
        exposure_times: vec![exposure_time; num_images],
        epochs,
    };
    scan.validate()?;
    Ok(scan)
}

impl Validate for Scan {
    fn validate(&self) -> Result<(), ModelError> {
        let (first, last) = self.image_range;
        if first == 0 || last < first {
            return Err(ModelError::invalid(
                "scan",
                format!("invalid image range {:?}", self.image_range),
            ));
        }
        let num_images = self.num_images();
        if self.epochs.len() != num_images {
            return Err(ModelError::invalid(
                "scan",
                format!(
                    "{} epochs given for {} images",
                    self.epochs.len(),
                    num_images
                ),
            ));
        }
        if self.exposure_times.len() != num_images {
            return Err(ModelError::invalid(
                "scan",
                format!(
                    "{} exposure times given for {} images",
                    self.exposure_times.len(),
                    num_images
                ),
            ));
        }
        Ok(())
    }
}
