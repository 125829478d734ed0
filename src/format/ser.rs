//! TIA series (SER) files
//!
//! Layout (little endian): a fixed series header, dimension arrays, an array
//! of data-element offsets and then the data elements. Each 2D element starts
//! with its own calibration header followed by the pixel array.
//!
//! A generic SER file carries no experiment geometry, so [`SerFormat`] only
//! recognises the container and gives access to the images. Instrument
//! specific formats build on [`SerFile`] to supply the models.

use super::{FormatError, FormatPlugin, FormatReader, RawImage};
use crate::model::{Beam, Detector, Goniometer, Scan};
use crate::stream::{self, ByteStream, StreamConfig};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) const FORMAT_NAME: &str = "SER";

const BYTE_ORDER: u16 = 0x4949;
const SERIES_ID: u16 = 0x0197;
const VERSION_32BIT_OFFSETS: u16 = 0x0210;
const VERSION_64BIT_OFFSETS: u16 = 0x0220;
const DATA_TYPE_1D: u32 = 0x4120;
const DATA_TYPE_2D: u32 = 0x4122;

/// Upper bound on the element count accepted from a header, so garbage
/// headers cannot trigger huge allocations.
const MAX_ELEMENTS: usize = 1 << 24;

/// Upper bound on the pixel count of one element (16384x16384).
const MAX_PIXELS: u64 = 1 << 28;

/// Pixel storage type of a data element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl ElementType {
    fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(ElementType::U8),
            2 => Some(ElementType::U16),
            3 => Some(ElementType::U32),
            4 => Some(ElementType::I8),
            5 => Some(ElementType::I16),
            6 => Some(ElementType::I32),
            7 => Some(ElementType::F32),
            8 => Some(ElementType::F64),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    fn decode(self, bytes: &[u8]) -> f64 {
        match self {
            ElementType::U8 => bytes[0] as f64,
            ElementType::I8 => bytes[0] as i8 as f64,
            ElementType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ElementType::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ElementType::U32 => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ElementType::I32 => {
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ElementType::F32 => {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ElementType::F64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                f64::from_le_bytes(raw)
            }
        }
    }
}

/// Fixed series header
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesHeader {
    pub version: u16,
    pub data_type: u32,
    pub tag_type: u32,
    pub total_elements: usize,
    pub valid_elements: usize,
    pub offset_array_offset: u64,
    pub dimensions: u32,
}

impl SeriesHeader {
    fn uses_64bit_offsets(&self) -> bool {
        self.version == VERSION_64BIT_OFFSETS
    }

    pub fn is_2d(&self) -> bool {
        self.data_type == DATA_TYPE_2D
    }
}

/// Calibration header of a 2D data element
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHeader {
    pub calibration_offset: (f64, f64),
    pub calibration_delta: (f64, f64),
    pub calibration_element: (i32, i32),
    pub element_type: ElementType,
    pub width: usize,
    pub height: usize,
}

/// Parsed SER header, offset table and first image header
#[derive(Debug, Clone)]
pub struct SerFile {
    pub header: SeriesHeader,
    pub data_offsets: Vec<u64>,
    pub first_image: Option<ImageHeader>,
}

impl SerFile {
    /// Parse every header needed to describe the series.
    pub fn read(path: &Path, config: &StreamConfig) -> Result<Self, FormatError> {
        let mut stream = SerStream::open(path, config)?;
        Self::read_from(&mut stream)
    }

    fn read_from(stream: &mut SerStream) -> Result<Self, FormatError> {
        let header = read_series_header(stream)?;

        stream.seek_to(header.offset_array_offset)?;
        let mut data_offsets = Vec::with_capacity(header.valid_elements);
        for _ in 0..header.valid_elements {
            let offset = if header.uses_64bit_offsets() {
                stream.u64()?
            } else {
                stream.u32()? as u64
            };
            data_offsets.push(offset);
        }

        let first_image = match data_offsets.first() {
            Some(&offset) if header.is_2d() => {
                stream.seek_to(offset)?;
                Some(read_image_header(stream)?)
            }
            _ => None,
        };

        Ok(Self {
            header,
            data_offsets,
            first_image,
        })
    }

    pub fn num_images(&self) -> usize {
        self.data_offsets.len()
    }

    /// Decode the pixels of image `index`.
    pub fn read_image(
        &self,
        path: &Path,
        index: usize,
        config: &StreamConfig,
    ) -> Result<RawImage, FormatError> {
        if !self.header.is_2d() {
            return Err(FormatError::Unsupported {
                format: FORMAT_NAME,
                operation: "raw data access for 1D series",
            });
        }

        let offset = *self.data_offsets.get(index).ok_or_else(|| FormatError::Header {
            format: FORMAT_NAME,
            reason: format!(
                "image {} requested from a series of {}",
                index,
                self.num_images()
            ),
        })?;

        let mut stream = SerStream::open(path, config)?;
        stream.seek_to(offset)?;
        let image = read_image_header(&mut stream)?;

        let size = image.element_type.size();
        let len = image
            .width
            .checked_mul(image.height)
            .and_then(|pixels| pixels.checked_mul(size))
            .ok_or_else(|| {
                malformed(format!("image {}x{} is too large", image.width, image.height))
            })?;
        let bytes = stream.read_exactly(len as u64)?;

        let pixels = bytes
            .chunks_exact(size)
            .map(|chunk| image.element_type.decode(chunk))
            .collect();

        Ok(RawImage {
            width: image.width,
            height: image.height,
            pixels,
        })
    }
}

/// Read just the series header, for cheap recognition.
pub fn read_header(path: &Path, config: &StreamConfig) -> Result<SeriesHeader, FormatError> {
    let mut stream = SerStream::open(path, config)?;
    read_series_header(&mut stream)
}

fn malformed(reason: impl Into<String>) -> FormatError {
    FormatError::Header {
        format: FORMAT_NAME,
        reason: reason.into(),
    }
}

fn read_series_header(stream: &mut SerStream) -> Result<SeriesHeader, FormatError> {
    let byte_order = stream.u16()?;
    let series_id = stream.u16()?;
    let version = stream.u16()?;

    if byte_order != BYTE_ORDER || series_id != SERIES_ID {
        return Err(malformed("missing SER signature"));
    }
    if version != VERSION_32BIT_OFFSETS && version != VERSION_64BIT_OFFSETS {
        return Err(malformed(format!("unsupported series version {:#06x}", version)));
    }

    let data_type = stream.u32()?;
    if data_type != DATA_TYPE_1D && data_type != DATA_TYPE_2D {
        return Err(malformed(format!("unknown data type {:#06x}", data_type)));
    }

    let tag_type = stream.u32()?;
    let total_elements = stream.u32()? as usize;
    let valid_elements = stream.u32()? as usize;
    if total_elements > MAX_ELEMENTS || valid_elements > total_elements {
        return Err(malformed(format!(
            "implausible element counts ({} valid of {})",
            valid_elements, total_elements
        )));
    }

    let offset_array_offset = if version == VERSION_64BIT_OFFSETS {
        stream.u64()?
    } else {
        stream.u32()? as u64
    };
    let dimensions = stream.u32()?;

    Ok(SeriesHeader {
        version,
        data_type,
        tag_type,
        total_elements,
        valid_elements,
        offset_array_offset,
        dimensions,
    })
}

fn read_image_header(stream: &mut SerStream) -> Result<ImageHeader, FormatError> {
    let offset_x = stream.f64()?;
    let delta_x = stream.f64()?;
    let element_x = stream.i32()?;
    let offset_y = stream.f64()?;
    let delta_y = stream.f64()?;
    let element_y = stream.i32()?;
    let type_code = stream.u16()?;
    let width = stream.i32()?;
    let height = stream.i32()?;

    let element_type = ElementType::from_code(type_code)
        .ok_or_else(|| malformed(format!("unsupported element type {}", type_code)))?;
    if width <= 0 || height <= 0 {
        return Err(malformed(format!("invalid image size {}x{}", width, height)));
    }
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(malformed(format!("image {}x{} is too large", width, height)));
    }

    Ok(ImageHeader {
        calibration_offset: (offset_x, offset_y),
        calibration_delta: (delta_x, delta_y),
        calibration_element: (element_x, element_y),
        element_type,
        width: width as usize,
        height: height as usize,
    })
}

/// Forward-only reader over a possibly compressed stream.
///
/// Seeking backwards reopens the stream from the start.
struct SerStream {
    path: PathBuf,
    config: StreamConfig,
    inner: ByteStream,
    position: u64,
}

impl SerStream {
    fn open(path: &Path, config: &StreamConfig) -> Result<Self, FormatError> {
        Ok(Self {
            path: path.to_path_buf(),
            config: config.clone(),
            inner: stream::open_file_with(path, config)?,
            position: 0,
        })
    }

    fn seek_to(&mut self, offset: u64) -> Result<(), FormatError> {
        if offset < self.position {
            debug!(path = %self.path.display(), offset, "Reopening stream to seek backwards");
            self.inner = stream::open_file_with(&self.path, &self.config)?;
            self.position = 0;
        }

        let wanted = offset - self.position;
        let mut limited = (&mut self.inner).take(wanted);
        let copied = io::copy(&mut limited, &mut io::sink());
        let skipped = copied.map_err(|e| self.io_error(e))?;
        self.position += skipped;

        if skipped < wanted {
            return Err(malformed(format!("offset {} is past the end of the file", offset)));
        }
        Ok(())
    }

    /// Read exactly `len` bytes. The buffer grows with the data actually read.
    fn read_exactly(&mut self, len: u64) -> Result<Vec<u8>, FormatError> {
        let mut bytes = Vec::new();
        let mut limited = (&mut self.inner).take(len);
        let read = limited.read_to_end(&mut bytes);
        let read = read.map_err(|e| self.io_error(e))?;
        self.position += read as u64;

        if (read as u64) < len {
            return Err(malformed("file is truncated"));
        }
        Ok(bytes)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), FormatError> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                malformed("file is truncated")
            } else {
                self.io_error(e)
            }
        })?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> FormatError {
        FormatError::Stream(stream::StreamError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, FormatError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, FormatError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> Result<f64, FormatError> {
        Ok(f64::from_le_bytes(self.array()?))
    }
}

/// Reader shared by SER-based formats: `start` parses the headers through
/// one open stream, `end` closes it.
pub(crate) struct SerReader {
    path: PathBuf,
    format: &'static str,
    config: StreamConfig,
    stream: Option<SerStream>,
    file: Option<SerFile>,
}

impl SerReader {
    pub(crate) fn new(path: &Path, format: &'static str, config: &StreamConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            config: config.clone(),
            stream: None,
            file: None,
        }
    }

    pub(crate) fn start(&mut self) -> anyhow::Result<()> {
        let stream = self.stream.insert(SerStream::open(&self.path, &self.config)?);
        self.file = Some(SerFile::read_from(stream)?);
        Ok(())
    }

    pub(crate) fn end(&mut self) {
        self.stream = None;
    }

    pub(crate) fn file(&self) -> anyhow::Result<&SerFile> {
        self.file
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("{} headers have not been read", self.format))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn no_model(&self, model: &str) -> anyhow::Error {
        anyhow::anyhow!(
            "{} files carry no {} description",
            self.format,
            model
        )
    }

    pub(crate) fn num_images(&self) -> usize {
        self.file.as_ref().map_or(0, SerFile::num_images)
    }

    pub(crate) fn raw_data(&mut self, index: usize) -> Result<RawImage, FormatError> {
        if self.file.is_none() {
            self.file = Some(SerFile::read(&self.path, &self.config)?);
        }
        match &self.file {
            Some(file) => file.read_image(&self.path, index, &self.config),
            None => Err(malformed("headers unavailable")),
        }
    }
}

/// Generic TIA series file
#[derive(Debug, Clone, Default)]
pub struct SerFormat {
    stream: StreamConfig,
}

impl SerFormat {
    pub fn new(stream: StreamConfig) -> Self {
        Self { stream }
    }
}

impl FormatPlugin for SerFormat {
    fn name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn understand(&self, path: &Path) -> u32 {
        match read_header(path, &self.stream) {
            Ok(_) => 1,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Not a SER file");
                0
            }
        }
    }

    fn reader(&self, path: &Path) -> Box<dyn FormatReader> {
        Box::new(GenericSerReader(SerReader::new(
            path,
            FORMAT_NAME,
            &self.stream,
        )))
    }
}

struct GenericSerReader(SerReader);

impl FormatReader for GenericSerReader {
    fn image_file(&self) -> &Path {
        self.0.path()
    }

    fn start(&mut self) -> anyhow::Result<()> {
        self.0.start()
    }

    fn end(&mut self) {
        self.0.end()
    }

    fn goniometer(&mut self) -> anyhow::Result<Goniometer> {
        Err(self.0.no_model("goniometer"))
    }

    fn detector(&mut self) -> anyhow::Result<Detector> {
        Err(self.0.no_model("detector"))
    }

    fn beam(&mut self) -> anyhow::Result<Beam> {
        Err(self.0.no_model("beam"))
    }

    fn scan(&mut self) -> anyhow::Result<Scan> {
        Err(self.0.no_model("scan"))
    }

    fn num_images(&self) -> usize {
        self.0.num_images()
    }

    fn raw_data(&mut self, index: usize) -> Result<RawImage, FormatError> {
        self.0.raw_data(index)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::format::FormatInstance;
    use std::fs;
    use tempfile::TempDir;

    // Integration tests carry a copy of this writer in tests/support/mod.rs
    // (`ser_series`); keep the two in step.

    /// Minimal version 0x0220 series of `count` 2D u16 images whose pixel
    /// values are their index within the image.
    pub(crate) fn ser_bytes(width: usize, height: usize, count: usize) -> Vec<u8> {
        series(VERSION_64BIT_OFFSETS, DATA_TYPE_2D, width, height, count, true)
    }

    /// Same series with the pixel arrays left out, for large image sizes.
    pub(crate) fn ser_headers(width: usize, height: usize, count: usize) -> Vec<u8> {
        series(VERSION_64BIT_OFFSETS, DATA_TYPE_2D, width, height, count, false)
    }

    fn series(
        version: u16,
        data_type: u32,
        width: usize,
        height: usize,
        count: usize,
        pixels: bool,
    ) -> Vec<u8> {
        let wide = version == VERSION_64BIT_OFFSETS;
        let offset_size = if wide { 8 } else { 4 };
        let header_len = 26 + offset_size;
        let offsets_len = 2 * offset_size * count as u64;
        let pixel_len = if pixels { 2 * (width * height) as u64 } else { 0 };
        let element_len = 50 + pixel_len;

        let push_offset = |out: &mut Vec<u8>, value: u64| {
            if wide {
                out.extend_from_slice(&value.to_le_bytes());
            } else {
                out.extend_from_slice(&(value as u32).to_le_bytes());
            }
        };

        let mut out = Vec::new();
        out.extend_from_slice(&BYTE_ORDER.to_le_bytes());
        out.extend_from_slice(&SERIES_ID.to_le_bytes());
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&data_type.to_le_bytes());
        out.extend_from_slice(&0x4152u32.to_le_bytes());
        out.extend_from_slice(&(count as u32).to_le_bytes());
        out.extend_from_slice(&(count as u32).to_le_bytes());
        push_offset(&mut out, header_len);
        out.extend_from_slice(&0u32.to_le_bytes());

        for i in 0..count as u64 {
            push_offset(&mut out, header_len + offsets_len + i * element_len);
        }
        for _ in 0..count {
            push_offset(&mut out, 0);
        }

        for _ in 0..count {
            for _ in 0..2 {
                out.extend_from_slice(&0f64.to_le_bytes());
                out.extend_from_slice(&1f64.to_le_bytes());
                out.extend_from_slice(&0i32.to_le_bytes());
            }
            out.extend_from_slice(&2u16.to_le_bytes());
            out.extend_from_slice(&(width as i32).to_le_bytes());
            out.extend_from_slice(&(height as i32).to_le_bytes());
            if pixels {
                for p in 0..width * height {
                    out.extend_from_slice(&(p as u16).to_le_bytes());
                }
            }
        }
        out
    }

    fn write(dir: &TempDir, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join("series.ser");
        fs::write(&path, bytes).unwrap();
        path
    }

    fn defaults() -> StreamConfig {
        StreamConfig::default()
    }

    #[test]
    fn test_read_series() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, &ser_bytes(4, 3, 2));

        let file = SerFile::read(&path, &defaults()).unwrap();
        assert_eq!(file.header.version, VERSION_64BIT_OFFSETS);
        assert!(file.header.is_2d());
        assert_eq!(file.num_images(), 2);

        let first = file.first_image.as_ref().unwrap();
        assert_eq!((first.width, first.height), (4, 3));
        assert_eq!(first.element_type, ElementType::U16);
    }

    #[test]
    fn test_read_series_with_32bit_offsets() {
        let dir = TempDir::new().unwrap();
        let bytes = series(VERSION_32BIT_OFFSETS, DATA_TYPE_2D, 4, 3, 2, true);
        let path = write(&dir, &bytes);

        let file = SerFile::read(&path, &defaults()).unwrap();
        assert_eq!(file.header.version, VERSION_32BIT_OFFSETS);
        assert_eq!(file.header.offset_array_offset, 30);
        assert_eq!(file.data_offsets, vec![46, 46 + 74]);

        let image = file.read_image(&path, 1, &defaults()).unwrap();
        assert_eq!(image.get(3, 2), Some(11.0));
    }

    #[test]
    fn test_read_image_pixels() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, &ser_bytes(4, 3, 2));

        let file = SerFile::read(&path, &defaults()).unwrap();
        let image = file.read_image(&path, 1, &defaults()).unwrap();
        assert_eq!(image.pixels.len(), 12);
        assert_eq!(image.get(3, 2), Some(11.0));
        assert!(file.read_image(&path, 2, &defaults()).is_err());
    }

    #[test]
    fn test_one_dimensional_series_has_no_images() {
        let dir = TempDir::new().unwrap();
        let bytes = series(VERSION_64BIT_OFFSETS, DATA_TYPE_1D, 4, 1, 1, false);
        let path = write(&dir, &bytes);

        let file = SerFile::read(&path, &defaults()).unwrap();
        assert!(!file.header.is_2d());
        assert!(file.first_image.is_none());
        assert!(matches!(
            file.read_image(&path, 0, &defaults()),
            Err(FormatError::Unsupported { .. })
        ));
        assert_eq!(SerFormat::default().understand(&path), 1);
    }

    #[test]
    fn test_oversized_element_is_an_error_not_a_panic() {
        let dir = TempDir::new().unwrap();
        let mut bytes = ser_headers(1, 1, 2);
        // Second element header: 34 byte series header, 32 byte offset
        // table, 50 byte first element, then 40 bytes of calibration.
        let element = 34 + 32 + 50 + 40;
        bytes[element..element + 2].copy_from_slice(&8u16.to_le_bytes());
        bytes[element + 2..element + 6].copy_from_slice(&i32::MAX.to_le_bytes());
        bytes[element + 6..element + 10].copy_from_slice(&i32::MAX.to_le_bytes());
        let path = write(&dir, &bytes);

        let mut instance = FormatInstance::open(&SerFormat::default(), &path).unwrap();
        assert_eq!(instance.num_images(), 2);
        assert!(matches!(
            instance.raw_data(1),
            Err(FormatError::Header { .. })
        ));
    }

    #[test]
    fn test_truncated_pixels_are_malformed() {
        let dir = TempDir::new().unwrap();
        let bytes = ser_bytes(64, 64, 1);
        let path = write(&dir, &bytes[..bytes.len() - 10]);

        let file = SerFile::read(&path, &defaults()).unwrap();
        assert!(matches!(
            file.read_image(&path, 0, &defaults()),
            Err(FormatError::Header { .. })
        ));
    }

    #[test]
    fn test_understand() {
        let dir = TempDir::new().unwrap();
        let ser = write(&dir, &ser_bytes(2, 2, 1));
        let other = dir.path().join("other.img");
        fs::write(&other, b"{ HEADER_BYTES=512; }").unwrap();

        let format = SerFormat::default();
        assert_eq!(format.understand(&ser), 1);
        assert_eq!(format.understand(&other), 0);
        assert_eq!(format.understand(Path::new("/nonexistent/a.ser")), 0);
    }

    #[test]
    fn test_truncated_header_is_malformed() {
        let dir = TempDir::new().unwrap();
        let bytes = ser_bytes(2, 2, 1);
        let path = write(&dir, &bytes[..20]);

        assert!(matches!(
            read_header(&path, &defaults()),
            Err(FormatError::Header { .. })
        ));
    }

    #[test]
    fn test_offset_past_end_is_malformed() {
        let dir = TempDir::new().unwrap();
        let bytes = ser_bytes(2, 2, 1);
        // Cut the file inside the offset table.
        let path = write(&dir, &bytes[..40]);

        assert!(SerFile::read(&path, &defaults()).is_err());
    }

    #[test]
    fn test_element_decoding() {
        assert_eq!(ElementType::I16.decode(&(-5i16).to_le_bytes()), -5.0);
        assert_eq!(ElementType::F32.decode(&1.5f32.to_le_bytes()), 1.5);
        assert_eq!(ElementType::I8.decode(&[0xFF]), -1.0);
        assert_eq!(ElementType::from_code(9), None);
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_remote_timeout_comes_from_stream_config() {
        use std::net::TcpListener;
        use std::time::{Duration, Instant};

        // Accepts connections into the backlog but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/image.ser", listener.local_addr().unwrap());

        let format = SerFormat::new(StreamConfig {
            remote_timeout: Duration::from_millis(300),
        });
        let started = Instant::now();

        assert_eq!(format.understand(Path::new(&url)), 0);
        assert!(started.elapsed() < Duration::from_secs(10));
        drop(listener);
    }
}
