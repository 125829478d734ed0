//! dxformat - diffraction image format detection and model extraction
//!
//! Image files are matched against a [`Registry`] of format plugins. Each
//! plugin scores how well it understands a file; the registry picks the
//! highest score and, among formats tied on it, the most specialized one.
//! The chosen plugin then reads the file through [`FormatInstance`], which
//! builds goniometer, detector, beam, scan and cube models from the header
//! and always releases the file afterwards.
//!
//! # Example
//!
//! ```no_run
//! use dxformat::{FormatInstance, Registry};
//! use std::path::Path;
//!
//! let registry = Registry::with_defaults();
//! let instance = FormatInstance::find_and_open(&registry, Path::new("image_0001.ser"))?;
//!
//! println!("{} images as {}", instance.num_images(), instance.format_name());
//! if let Some(beam) = instance.beam() {
//!     println!("wavelength {}", beam.wavelength);
//! }
//! # Ok::<(), dxformat::FormatError>(())
//! ```
//!
//! # Project Structure
//!
//! - [`format`]: plugin contract, registry, lifecycle and built-in formats
//! - [`model`]: experiment models and their validation
//! - [`stream`]: transparent access to plain, compressed and remote files
//! - [`cli`]: the `dxformat` command-line front end

pub mod cli;
pub mod config;
pub mod format;
pub mod model;
pub mod stream;
pub mod util;

pub use config::{ConfigError, DxformatConfig};
pub use format::{
    setup, FieldOutcome, FormatError, FormatInstance, FormatPlugin, FormatReader, ModelSet,
    RawImage, Registry, RegistryError,
};
pub use model::{ModelError, Validate};
pub use stream::{is_bz2, is_gzip, is_url, open_file, Encoding, StreamError};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
