//! Staged construction of experiment models from one image file
//!
//! [`setup`] runs a reader through three stages, once:
//!
//! 1. **Start**: `start()` acquires the file. If it fails no builder runs.
//! 2. **Build**: goniometer, detector, beam, scan and cube builders run in
//!    order. A failed or invalid model only leaves its own field absent.
//! 3. **Teardown**: `end()` runs exactly once on every path out of the first
//!    two stages, including unwinding from a panicking hook.

use super::{FormatError, FormatPlugin, FormatReader, RawImage, Registry};
use crate::model::{Beam, Cube, Detector, Goniometer, Scan, Validate};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of building one model
#[derive(Debug)]
pub enum FieldOutcome<T> {
    Present(T),
    Failed(anyhow::Error),
    /// The builder never ran because the file could not be opened
    NotAttempted,
}

impl<T> Default for FieldOutcome<T> {
    fn default() -> Self {
        FieldOutcome::NotAttempted
    }
}

impl<T> FieldOutcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            FieldOutcome::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            FieldOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, FieldOutcome::Present(_))
    }
}

/// Models extracted from one image file
#[derive(Debug, Default)]
pub struct ModelSet {
    pub goniometer: FieldOutcome<Goniometer>,
    pub detector: FieldOutcome<Detector>,
    pub beam: FieldOutcome<Beam>,
    pub scan: FieldOutcome<Scan>,
    pub cube: FieldOutcome<Cube>,
    /// Why `start()` failed, if it did
    pub start_error: Option<anyhow::Error>,
}

impl ModelSet {
    /// Failure reason per field, in build order.
    pub fn failures(&self) -> Vec<(&'static str, &anyhow::Error)> {
        let fields = [
            ("goniometer", self.goniometer.error()),
            ("detector", self.detector.error()),
            ("beam", self.beam.error()),
            ("scan", self.scan.error()),
            ("cube", self.cube.error()),
        ];
        fields
            .into_iter()
            .filter_map(|(name, error)| error.map(|e| (name, e)))
            .collect()
    }

    pub fn present_count(&self) -> usize {
        [
            self.goniometer.is_present(),
            self.detector.is_present(),
            self.beam.is_present(),
            self.scan.is_present(),
            self.cube.is_present(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Calls `end()` when dropped, so teardown also runs while unwinding.
struct Teardown<'a>(&'a mut (dyn FormatReader + 'a));

impl<'a> Deref for Teardown<'a> {
    type Target = dyn FormatReader + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<'a> DerefMut for Teardown<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.0
    }
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        self.0.end();
    }
}

/// Run the Start, Build and Teardown stages for one reader.
///
/// Never fails: every error is logged and recorded in the returned set.
pub fn setup(reader: &mut dyn FormatReader) -> ModelSet {
    let path = reader.image_file().display().to_string();
    let mut models = ModelSet::default();
    let mut reader = Teardown(reader);

    if let Err(e) = reader.start() {
        warn!(path = %path, error = ?e, "Failed to start reading image");
        models.start_error = Some(e);
        return models;
    }

    models.goniometer = checked(&path, "goniometer", reader.goniometer());
    models.detector = checked(&path, "detector", reader.detector());
    models.beam = checked(&path, "beam", reader.beam());
    models.scan = checked(&path, "scan", reader.scan());
    models.cube = checked(&path, "cube", reader.cube());

    debug!(path = %path, present = models.present_count(), "Image models built");
    models
}

fn checked<T: Validate>(path: &str, field: &str, built: anyhow::Result<T>) -> FieldOutcome<T> {
    let outcome = built.and_then(|model| {
        model.validate()?;
        Ok(model)
    });

    match outcome {
        Ok(model) => FieldOutcome::Present(model),
        Err(e) => {
            warn!(path = %path, field, error = ?e, "Failed to build model");
            FieldOutcome::Failed(e)
        }
    }
}

/// One image file read through one format
pub struct FormatInstance {
    format: &'static str,
    image_file: PathBuf,
    reader: Box<dyn FormatReader>,
    models: ModelSet,
}

impl FormatInstance {
    /// Read `path` with an explicitly chosen format.
    ///
    /// Fails with [`FormatError::Misdeclared`] before any reader is created if
    /// the format does not understand the file.
    pub fn open(plugin: &dyn FormatPlugin, path: &Path) -> Result<Self, FormatError> {
        if plugin.understand(path) == 0 {
            return Err(FormatError::Misdeclared {
                format: plugin.name(),
                path: path.to_path_buf(),
            });
        }

        let mut reader = plugin.reader(path);
        let models = setup(reader.as_mut());

        Ok(Self {
            format: plugin.name(),
            image_file: path.to_path_buf(),
            reader,
            models,
        })
    }

    /// Resolve the format through a registry, then read the file with it.
    pub fn find_and_open(registry: &Registry, path: &Path) -> Result<Self, FormatError> {
        let plugin = registry.find(path)?;
        Self::open(plugin, path)
    }

    pub fn format_name(&self) -> &'static str {
        self.format
    }

    pub fn image_file(&self) -> &Path {
        &self.image_file
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn goniometer(&self) -> Option<&Goniometer> {
        self.models.goniometer.value()
    }

    pub fn detector(&self) -> Option<&Detector> {
        self.models.detector.value()
    }

    pub fn beam(&self) -> Option<&Beam> {
        self.models.beam.value()
    }

    pub fn scan(&self) -> Option<&Scan> {
        self.models.scan.value()
    }

    pub fn cube(&self) -> Option<&Cube> {
        self.models.cube.value()
    }

    pub fn num_images(&self) -> usize {
        self.reader.num_images()
    }

    pub fn raw_data(&mut self, index: usize) -> Result<RawImage, FormatError> {
        self.reader.raw_data(index)
    }
}
