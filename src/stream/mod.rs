//! Transparent byte-stream access for image files.
//!
//! Every format reader goes through [`open_file`] so that URLs and gzip or
//! bzip2 compressed images are handled the same way as plain local files.
//! Encoding is detected from the leading magic bytes only, never from the
//! file extension.

use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Magic bytes at the start of a bzip2 stream.
pub const BZ2_MAGIC: [u8; 3] = *b"BZh";

/// Magic bytes at the start of a gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// A readable byte stream handed to format readers.
pub type ByteStream = Box<dyn Read + Send>;

/// Errors raised while opening an image stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The stream was detected as compressed (or remote) but the decoder for
    /// it was not compiled in.
    #[error("{} is {encoding} encoded but {encoding} support is not available in this build", path.display())]
    MissingDecoder { path: PathBuf, encoding: Encoding },

    #[error("Failed to fetch {url}: {message}")]
    Remote { url: String, message: String },
}

/// How the bytes behind a path are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Plain,
    Gzip,
    Bzip2,
    Url,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Plain => "plain",
            Encoding::Gzip => "gzip",
            Encoding::Bzip2 => "bzip2",
            Encoding::Url => "url",
        };
        f.write_str(name)
    }
}

impl Encoding {
    /// Classify a path, reading at most three bytes of it.
    ///
    /// Missing, unreadable, empty or truncated files are `Plain`: detection
    /// itself never fails, the subsequent open reports the real problem.
    pub fn detect(path: &Path) -> Self {
        if is_url(path) {
            return Encoding::Url;
        }

        let magic = read_magic(path);
        if magic.starts_with(&BZ2_MAGIC) {
            Encoding::Bzip2
        } else if magic.starts_with(&GZIP_MAGIC) {
            Encoding::Gzip
        } else {
            Encoding::Plain
        }
    }
}

/// Options for [`open_file_with`]
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Timeout for remote (URL) images
    pub remote_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
        }
    }
}

/// True if the path carries a URL scheme such as `http://` or `file://`.
///
/// Single-letter schemes are rejected so Windows drive letters (`C:\...`)
/// are treated as local paths.
pub fn is_url(path: &Path) -> bool {
    let Some(text) = path.to_str() else {
        return false;
    };

    match url::Url::parse(text) {
        Ok(url) => url.scheme().len() > 1,
        Err(_) => false,
    }
}

/// True if the file starts with the bzip2 signature `BZh`.
pub fn is_bz2(path: &Path) -> bool {
    read_magic(path).starts_with(&BZ2_MAGIC)
}

/// True if the file starts with the gzip signature `1F 8B`.
pub fn is_gzip(path: &Path) -> bool {
    read_magic(path).starts_with(&GZIP_MAGIC)
}

/// Open a path for binary reading with default options.
pub fn open_file(path: &Path) -> Result<ByteStream, StreamError> {
    open_file_with(path, &StreamConfig::default())
}

/// Open a path for binary reading, decompressing or fetching as required.
pub fn open_file_with(path: &Path, config: &StreamConfig) -> Result<ByteStream, StreamError> {
    let encoding = Encoding::detect(path);
    debug!(path = %path.display(), %encoding, "Opening image stream");

    match encoding {
        Encoding::Url => open_remote(path, config),
        Encoding::Bzip2 => open_bzip2(path),
        Encoding::Gzip => open_gzip(path),
        Encoding::Plain => Ok(Box::new(open_local(path)?)),
    }
}

fn read_magic(path: &Path) -> Vec<u8> {
    let mut magic = Vec::with_capacity(BZ2_MAGIC.len());
    if let Ok(file) = File::open(path) {
        // Short reads and I/O errors both leave a prefix that matches nothing.
        let _ = file.take(BZ2_MAGIC.len() as u64).read_to_end(&mut magic);
    }
    magic
}

fn open_local(path: &Path) -> Result<BufReader<File>, StreamError> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(StreamError::NotFound(path.to_path_buf()))
        }
        Err(source) => Err(StreamError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(feature = "gzip")]
fn open_gzip(path: &Path) -> Result<ByteStream, StreamError> {
    let file = open_local(path)?;
    Ok(Box::new(flate2::read::MultiGzDecoder::new(file)))
}

#[cfg(not(feature = "gzip"))]
fn open_gzip(path: &Path) -> Result<ByteStream, StreamError> {
    Err(StreamError::MissingDecoder {
        path: path.to_path_buf(),
        encoding: Encoding::Gzip,
    })
}

#[cfg(feature = "bzip2")]
fn open_bzip2(path: &Path) -> Result<ByteStream, StreamError> {
    let file = open_local(path)?;
    Ok(Box::new(bzip2::read::MultiBzDecoder::new(file)))
}

#[cfg(not(feature = "bzip2"))]
fn open_bzip2(path: &Path) -> Result<ByteStream, StreamError> {
    Err(StreamError::MissingDecoder {
        path: path.to_path_buf(),
        encoding: Encoding::Bzip2,
    })
}

#[cfg(feature = "remote")]
fn open_remote(path: &Path, config: &StreamConfig) -> Result<ByteStream, StreamError> {
    let url = path.to_string_lossy().into_owned();
    let remote_error = |message: String| StreamError::Remote {
        url: url.clone(),
        message,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(config.remote_timeout)
        .build()
        .map_err(|e| remote_error(e.to_string()))?;

    let response = client
        .get(url.as_str())
        .send()
        .map_err(|e| remote_error(e.to_string()))?;

    if !response.status().is_success() {
        return Err(remote_error(format!("HTTP {}", response.status())));
    }

    Ok(Box::new(response))
}

#[cfg(not(feature = "remote"))]
fn open_remote(path: &Path, _config: &StreamConfig) -> Result<ByteStream, StreamError> {
    Err(StreamError::MissingDecoder {
        path: path.to_path_buf(),
        encoding: Encoding::Url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_gzip_magic_on_two_byte_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "tiny.img", &[0x1F, 0x8B]);

        assert!(is_gzip(&path));
        assert!(!is_bz2(&path));
        assert_eq!(Encoding::detect(&path), Encoding::Gzip);
    }

    #[test]
    fn test_bz2_magic_on_three_byte_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "tiny.img", b"BZh");

        assert!(is_bz2(&path));
        assert!(!is_gzip(&path));
        assert_eq!(Encoding::detect(&path), Encoding::Bzip2);
    }

    #[test]
    fn test_detection_on_empty_and_truncated_files() {
        let dir = TempDir::new().unwrap();
        let empty = write_file(&dir, "empty.img", &[]);
        let one_byte = write_file(&dir, "one.img", &[0x1F]);
        let two_bytes = write_file(&dir, "two.img", b"BZ");

        for path in [&empty, &one_byte, &two_bytes] {
            assert!(!is_gzip(path));
            assert!(!is_bz2(path));
            assert_eq!(Encoding::detect(path), Encoding::Plain);
        }
    }

    #[test]
    fn test_detection_on_missing_file_is_plain() {
        let path = Path::new("/nonexistent/dxformat/image.cbf");
        assert!(!is_gzip(path));
        assert!(!is_bz2(path));
        assert_eq!(Encoding::detect(path), Encoding::Plain);
    }

    #[test]
    fn test_is_url() {
        assert!(is_url(Path::new("http://example.org/image_0001.cbf")));
        assert!(is_url(Path::new("file:///data/image_0001.cbf")));
        assert!(!is_url(Path::new("/data/image_0001.cbf")));
        assert!(!is_url(Path::new("relative/image_0001.cbf")));
        assert!(!is_url(Path::new("C:\\data\\image_0001.cbf")));
    }

    #[test]
    fn test_open_missing_file_is_not_found() {
        let result = open_file(Path::new("/nonexistent/dxformat/image.cbf"));
        assert!(matches!(result, Err(StreamError::NotFound(_))));
    }

    #[test]
    fn test_open_plain_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "plain.img", b"HEADER plain bytes");

        let mut content = Vec::new();
        open_file(&path).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"HEADER plain bytes");
    }

    #[test]
    fn test_open_gzip_file() {
        let dir = TempDir::new().unwrap();
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"gzipped header").unwrap();
        let path = write_file(&dir, "image.img", &encoder.finish().unwrap());

        let mut content = Vec::new();
        open_file(&path).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"gzipped header");
    }

    #[test]
    fn test_encoding_display() {
        assert_eq!(Encoding::Gzip.to_string(), "gzip");
        assert_eq!(Encoding::Bzip2.to_string(), "bzip2");
        assert_eq!(Encoding::Plain.to_string(), "plain");
        assert_eq!(Encoding::Url.to_string(), "url");
    }

    #[test]
    fn test_missing_decoder_message() {
        let err = StreamError::MissingDecoder {
            path: PathBuf::from("/data/image.cbf.bz2"),
            encoding: Encoding::Bzip2,
        };
        assert!(err.to_string().contains("bzip2 support is not available"));
    }

    #[cfg(not(feature = "gzip"))]
    #[test]
    fn test_gzip_without_decoder() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "image.cbf.gz", &[0x1F, 0x8B, 0x08, 0x00]);

        let err = open_file(&path).err().unwrap();
        assert!(matches!(
            err,
            StreamError::MissingDecoder {
                encoding: Encoding::Gzip,
                ..
            }
        ));
    }

    #[cfg(not(feature = "bzip2"))]
    #[test]
    fn test_bzip2_without_decoder() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "image.cbf.bz2", b"BZh91AY&SY");

        let err = open_file(&path).err().unwrap();
        assert!(matches!(
            err,
            StreamError::MissingDecoder {
                encoding: Encoding::Bzip2,
                ..
            }
        ));
    }

    #[cfg(not(feature = "remote"))]
    #[test]
    fn test_url_without_remote_support() {
        let err = open_file(Path::new("https://example.org/image.cbf"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StreamError::MissingDecoder {
                encoding: Encoding::Url,
                ..
            }
        ));
    }
}
