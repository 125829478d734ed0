#![allow(dead_code)]

use bzip2::write::BzEncoder;
use dxformat::format::{FormatPlugin, FormatReader};
use dxformat::model::{Beam, Detector, Goniometer, Scan};
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn get_dxformat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.join("dxformat")
}

/// Version 0x0220 TIA series of `count` u16 images. Pixel arrays are only
/// written when `pixels` is set.
///
/// Integration tests cannot reach the crate's `#[cfg(test)]` writer in
/// `src/format/ser.rs`; keep the two in step.
pub fn ser_series(width: usize, height: usize, count: usize, pixels: bool) -> Vec<u8> {
    let header_len = 34u64;
    let offsets_len = 16 * count as u64;
    let pixel_len = if pixels { 2 * (width * height) as u64 } else { 0 };
    let element_len = 50 + pixel_len;

    let mut out = Vec::new();
    out.extend_from_slice(&0x4949u16.to_le_bytes());
    out.extend_from_slice(&0x0197u16.to_le_bytes());
    out.extend_from_slice(&0x0220u16.to_le_bytes());
    out.extend_from_slice(&0x4122u32.to_le_bytes());
    out.extend_from_slice(&0x4152u32.to_le_bytes());
    out.extend_from_slice(&(count as u32).to_le_bytes());
    out.extend_from_slice(&(count as u32).to_le_bytes());
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    for i in 0..count as u64 {
        let offset = header_len + offsets_len + i * element_len;
        out.extend_from_slice(&offset.to_le_bytes());
    }
    for _ in 0..count {
        out.extend_from_slice(&0u64.to_le_bytes());
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

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn bzip2(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Plugin whose score depends only on a marker string in the file
pub struct MarkerFormat {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub marker: &'static str,
    pub score: u32,
    pub ends: Arc<AtomicUsize>,
}

impl MarkerFormat {
    pub fn new(
        name: &'static str,
        parent: Option<&'static str>,
        marker: &'static str,
        score: u32,
    ) -> Self {
        Self {
            name,
            parent,
            marker,
            score,
            ends: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn shared(self) -> Arc<dyn FormatPlugin> {
        Arc::new(self)
    }
}

impl FormatPlugin for MarkerFormat {
    fn name(&self) -> &'static str {
        self.name
    }

    fn specializes(&self) -> Option<&'static str> {
        self.parent
    }

    fn understand(&self, path: &Path) -> u32 {
        match std::fs::read_to_string(path) {
            Ok(text) if text.contains(self.marker) => self.score,
            _ => 0,
        }
    }

    fn reader(&self, path: &Path) -> Box<dyn FormatReader> {
        Box::new(MarkerReader {
            path: path.to_path_buf(),
            ends: self.ends.clone(),
        })
    }
}

/// Reader that builds only a beam and counts teardowns
pub struct MarkerReader {
    path: PathBuf,
    ends: Arc<AtomicUsize>,
}

impl FormatReader for MarkerReader {
    fn image_file(&self) -> &Path {
        &self.path
    }

    fn end(&mut self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }

    fn goniometer(&mut self) -> anyhow::Result<Goniometer> {
        anyhow::bail!("marker files have no goniometer")
    }

    fn detector(&mut self) -> anyhow::Result<Detector> {
        anyhow::bail!("marker files have no detector")
    }

    fn beam(&mut self) -> anyhow::Result<Beam> {
        Ok(dxformat::model::beam::simple(1.0)?)
    }

    fn scan(&mut self) -> anyhow::Result<Scan> {
        anyhow::bail!("marker files have no scan")
    }
}
