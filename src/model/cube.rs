//! Raw data cube descriptor

use super::{ModelError, Validate};
use crate::stream::{self, Encoding};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Location of the raw pixel data behind an image file.
///
/// The cube only describes where the data lives; pixels are read on demand
/// through the format reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cube {
    pub source: PathBuf,
    pub encoding: Encoding,
    /// Size of the stored (possibly compressed) file, unknown for URLs
    pub stored_bytes: Option<u64>,
}

/// Generic cube for any local or remote image file.
pub fn from_filename(path: &Path) -> Result<Cube, ModelError> {
    let encoding = Encoding::detect(path);

    let stored_bytes = if encoding == Encoding::Url {
        None
    } else {
        let metadata = std::fs::metadata(path).map_err(|e| {
            ModelError::invalid("cube", format!("cannot stat {}: {}", path.display(), e))
        })?;
        Some(metadata.len())
    };

    let cube = Cube {
        source: path.to_path_buf(),
        encoding,
        stored_bytes,
    };
    cube.validate()?;
    Ok(cube)
}

impl Validate for Cube {
    fn validate(&self) -> Result<(), ModelError> {
        if self.source.as_os_str().is_empty() {
            return Err(ModelError::invalid("cube", "empty source path"));
        }
        if self.encoding != Encoding::Url && stream::is_url(&self.source) {
            return Err(ModelError::invalid(
                "cube",
                "URL source recorded with a local encoding",
            ));
        }
        Ok(())
    }
}
