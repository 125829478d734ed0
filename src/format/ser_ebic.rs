//! SER files from the FEI microscope at eBIC
//!
//! The files carry no geometry, so the models are fixed dummies for a
//! 4096x4096 camera at 200 keV.

use super::ser::{self, SerFile, SerReader};
use super::{FormatError, FormatPlugin, FormatReader, RawImage};
use crate::model::{beam, detector, goniometer, scan, Beam, Detector, Goniometer, Scan};
use crate::stream::StreamConfig;
use std::path::Path;
use tracing::debug;

const FORMAT_NAME: &str = "SEReBIC";

const IMAGE_SIZE: (usize, usize) = (4096, 4096);
const PIXEL_SIZE: (f64, f64) = (0.014, 0.014);
const DISTANCE: f64 = 2000.0;
const TRUSTED_RANGE: (f64, f64) = (-1.0, 65535.0);
/// Electron wavelength at 200 keV, in Angstrom
const WAVELENGTH: f64 = 0.02508;
const OSCILLATION: (f64, f64) = (0.0, 0.5);

/// eBIC specialization of the SER format
#[derive(Debug, Clone, Default)]
pub struct SerEbicFormat {
    stream: StreamConfig,
}

impl SerEbicFormat {
    pub fn new(stream: StreamConfig) -> Self {
        Self { stream }
    }
}

impl FormatPlugin for SerEbicFormat {
    fn name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn specializes(&self) -> Option<&'static str> {
        Some(ser::FORMAT_NAME)
    }

    fn understand(&self, path: &Path) -> u32 {
        let file = match SerFile::read(path, &self.stream) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Not an eBIC SER file");
                return 0;
            }
        };

        match &file.first_image {
            Some(image) if (image.width, image.height) == IMAGE_SIZE => 1,
            _ => 0,
        }
    }

    fn reader(&self, path: &Path) -> Box<dyn FormatReader> {
        Box::new(EbicReader(SerReader::new(path, FORMAT_NAME, &self.stream)))
    }
}

struct EbicReader(SerReader);

impl FormatReader for EbicReader {
    fn image_file(&self) -> &Path {
        self.0.path()
    }

    fn start(&mut self) -> anyhow::Result<()> {
        self.0.start()
    }

    fn end(&mut self) {
        self.0.end()
    }

    /// Vertical rotation axis as the images are viewed.
    fn goniometer(&mut self) -> anyhow::Result<Goniometer> {
        Ok(goniometer::known_axis([0.0, -1.0, 0.0])?)
    }

    fn detector(&mut self) -> anyhow::Result<Detector> {
        let beam_centre = (
            PIXEL_SIZE.0 * IMAGE_SIZE.0 as f64 / 2.0,
            PIXEL_SIZE.1 * IMAGE_SIZE.1 as f64 / 2.0,
        );
        Ok(detector::simple(
            "PAD",
            DISTANCE,
            beam_centre,
            "+x",
            "-y",
            PIXEL_SIZE,
            IMAGE_SIZE,
            TRUSTED_RANGE,
        )?)
    }

    fn beam(&mut self) -> anyhow::Result<Beam> {
        Ok(beam::simple(WAVELENGTH)?)
    }

    fn scan(&mut self) -> anyhow::Result<Scan> {
        let frames = self.0.file()?.num_images();
        // TODO: use the acquisition times from the element tags as epochs.
        let epochs = vec![0.0; frames];
        Ok(scan::make_scan((1, frames), 0.0, OSCILLATION, epochs, true)?)
    }

    fn num_images(&self) -> usize {
        self.0.num_images()
    }

    fn raw_data(&mut self, index: usize) -> Result<RawImage, FormatError> {
        self.0.raw_data(index)
    }
}
