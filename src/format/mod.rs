//! Image format plugins
//!
//! A format is described at two levels:
//!
//! - [`FormatPlugin`] is the class-level description held by the
//!   [`Registry`]: a name, the format it specializes, and a confidence score
//!   for any path.
//! - [`FormatReader`] is the per-file state created by a plugin. Its hooks are
//!   driven by [`lifecycle::setup`] to turn a header into experiment models.
//!
//! Confidence scores follow a loose convention: 0 means the file cannot be
//! read at all, 1 means it is generically parseable, 2 and above mean it was
//! recognised as coming from a specific instrument.

pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod ser;
pub mod ser_ebic;

pub use error::{FormatError, RegistryError};
pub use lifecycle::{setup, FieldOutcome, FormatInstance, ModelSet};
pub use registry::{Candidate, Registry};
pub use ser::SerFormat;
pub use ser_ebic::SerEbicFormat;

use crate::model::{cube, Beam, Cube, Detector, Goniometer, Scan};
use serde::Serialize;
use std::path::Path;

/// Class-level description of an image format
pub trait FormatPlugin: Send + Sync {
    /// Unique, human-readable format name (e.g. "SER")
    fn name(&self) -> &'static str;

    /// Name of the format this one refines, if any
    fn specializes(&self) -> Option<&'static str> {
        None
    }

    /// Confidence that this format can read `path`.
    ///
    /// Must not panic or leave resources open for unreadable or malformed
    /// files: return 0 instead.
    fn understand(&self, path: &Path) -> u32;

    /// Create the per-file reader; hooks run later through `setup`.
    fn reader(&self, path: &Path) -> Box<dyn FormatReader>;
}

/// Per-file hooks of a format
///
/// `start` may acquire a resource (usually the open stream), `end` must
/// release it and is always called, even when `start` failed.
pub trait FormatReader: Send {
    fn image_file(&self) -> &Path;

    fn start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn end(&mut self) {}

    fn goniometer(&mut self) -> anyhow::Result<Goniometer>;

    fn detector(&mut self) -> anyhow::Result<Detector>;

    fn beam(&mut self) -> anyhow::Result<Beam>;

    fn scan(&mut self) -> anyhow::Result<Scan>;

    fn cube(&mut self) -> anyhow::Result<Cube> {
        Ok(cube::from_filename(self.image_file())?)
    }

    /// Number of images stored in the file
    fn num_images(&self) -> usize {
        1
    }

    /// Decoded pixels of one image
    fn raw_data(&mut self, index: usize) -> Result<RawImage, FormatError> {
        let _ = index;
        Err(FormatError::Unsupported {
            format: "format",
            operation: "raw data access",
        })
    }
}

/// Decoded pixels of a single 2D image, row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<f64>,
}

impl RawImage {
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_image_indexing() {
        let image = RawImage {
            width: 2,
            height: 2,
            pixels: vec![1.0, 2.0, 3.0, 4.0],
        };
        assert_eq!(image.get(1, 0), Some(2.0));
        assert_eq!(image.get(0, 1), Some(3.0));
        assert_eq!(image.get(2, 0), None);
    }
}
