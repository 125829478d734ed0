//! Output formatting for CLI reports
//!
//! Every report can be rendered as JSON, YAML or human-readable text. The
//! report types are plain `Serialize` structs so the machine-readable formats
//! stay in sync with the human one.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::format::registry::FormatInfo;
use crate::format::{Candidate, FormatInstance};
use crate::model::{Beam, Cube, Detector, Goniometer, Scan};
use crate::stream::Encoding;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Format resolution result for one file
#[derive(Debug, Clone, Serialize)]
pub struct FindReport {
    pub path: String,
    pub encoding: Encoding,
    pub format: Option<&'static str>,
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<Candidate>,
}

impl FindReport {
    pub fn is_resolved(&self) -> bool {
        self.format.is_some()
    }
}

/// A model that could not be built, and why
#[derive(Debug, Clone, Serialize)]
pub struct FieldFailure {
    pub field: &'static str,
    pub reason: String,
}

/// Everything read from one file
#[derive(Debug, Clone, Serialize)]
pub struct InstanceReport {
    pub path: String,
    pub format: &'static str,
    pub num_images: usize,
    pub goniometer: Option<Goniometer>,
    pub detector: Option<Detector>,
    pub beam: Option<Beam>,
    pub scan: Option<Scan>,
    pub cube: Option<Cube>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FieldFailure>,
}

impl InstanceReport {
    pub fn from_instance(instance: &FormatInstance) -> Self {
        let models = instance.models();
        Self {
            path: display_path(instance.image_file()),
            format: instance.format_name(),
            num_images: instance.num_images(),
            goniometer: instance.goniometer().cloned(),
            detector: instance.detector().cloned(),
            beam: instance.beam().cloned(),
            scan: instance.scan().cloned(),
            cube: instance.cube().cloned(),
            start_error: models.start_error.as_ref().map(|e| format!("{:#}", e)),
            failures: models
                .failures()
                .into_iter()
                .map(|(field, error)| FieldFailure {
                    field,
                    reason: format!("{:#}", error),
                })
                .collect(),
        }
    }
}

pub(crate) fn display_path(path: &Path) -> String {
    path.display().to_string()
}

/// Output formatter for CLI reports
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_find(&self, reports: &[FindReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(reports, "find results"),
            OutputFormat::Yaml => to_yaml(reports, "find results"),
            OutputFormat::Human => Ok(self.format_find_human(reports)),
        }
    }

    pub fn format_instance(&self, report: &InstanceReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report, "image models"),
            OutputFormat::Yaml => to_yaml(report, "image models"),
            OutputFormat::Human => Ok(self.format_instance_human(report)),
        }
    }

    pub fn format_formats(&self, formats: &[FormatInfo]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(formats, "format list"),
            OutputFormat::Yaml => to_yaml(formats, "format list"),
            OutputFormat::Human => Ok(self.format_formats_human(formats)),
        }
    }

    fn format_find_human(&self, reports: &[FindReport]) -> String {
        let mut output = String::new();

        for report in reports {
            match (report.format, report.score) {
                (Some(format), Some(score)) => {
                    let _ = writeln!(
                        output,
                        "\u{2713} {}: {} (score {}, {})",
                        report.path, format, score, report.encoding
                    );
                }
                _ => {
                    let reason = report.error.as_deref().unwrap_or("not recognised");
                    let _ = writeln!(output, "\u{2717} {}: {}", report.path, reason);
                }
            }

            for (i, candidate) in report.candidates.iter().enumerate() {
                let connector = if i + 1 == report.candidates.len() {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                let _ = writeln!(
                    output,
                    "  {}\u{2500} {:<width$} {}",
                    connector,
                    candidate.name,
                    candidate.score,
                    width = 12 + 2 * candidate.depth,
                );
            }
        }

        output
    }

    fn format_instance_human(&self, report: &InstanceReport) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "Image: {}", report.path);
        output.push_str(&rule());
        output.push_str("\n\n");
        let _ = writeln!(output, "Format:      {}", report.format);
        let _ = writeln!(output, "Images:      {}", report.num_images);

        if let Some(error) = &report.start_error {
            let _ = writeln!(output, "\n\u{26A0} Could not read file: {}", error);
            return output;
        }

        output.push_str("\nModels:\n");
        match &report.goniometer {
            Some(gonio) => {
                let _ = writeln!(
                    output,
                    "\u{251C}\u{2500} Goniometer: axis {}",
                    vector(&gonio.rotation_axis)
                );
            }
            None => output.push_str("\u{251C}\u{2500} Goniometer: (not available)\n"),
        }
        match &report.detector {
            Some(detector) => {
                let _ = writeln!(
                    output,
                    "\u{251C}\u{2500} Detector:   {} panel(s)",
                    detector.panels.len()
                );
                for panel in &detector.panels {
                    let _ = writeln!(
                        output,
                        "\u{2502}  \u{2500} {} {}x{} px, {}x{} mm pixels, origin {}",
                        panel.sensor,
                        panel.image_size.0,
                        panel.image_size.1,
                        panel.pixel_size.0,
                        panel.pixel_size.1,
                        vector(&panel.origin)
                    );
                }
            }
            None => output.push_str("\u{251C}\u{2500} Detector:   (not available)\n"),
        }
        match &report.beam {
            Some(beam) => {
                let _ = writeln!(
                    output,
                    "\u{251C}\u{2500} Beam:       wavelength {} \u{212B}, direction {}",
                    beam.wavelength,
                    vector(&beam.direction)
                );
            }
            None => output.push_str("\u{251C}\u{2500} Beam:       (not available)\n"),
        }
        match &report.scan {
            Some(scan) => {
                let (start, end) = scan.oscillation_range();
                let _ = writeln!(
                    output,
                    "\u{251C}\u{2500} Scan:       images {}-{}, {:.3}\u{00B0} to {:.3}\u{00B0}",
                    scan.image_range.0, scan.image_range.1, start, end
                );
            }
            None => output.push_str("\u{251C}\u{2500} Scan:       (not available)\n"),
        }
        match &report.cube {
            Some(cube) => {
                let _ = writeln!(
                    output,
                    "\u{2514}\u{2500} Cube:       {} ({})",
                    cube.source.display(),
                    cube.encoding
                );
            }
            None => output.push_str("\u{2514}\u{2500} Cube:       (not available)\n"),
        }

        if !report.failures.is_empty() {
            output.push_str("\n\u{26A0} Failures:\n");
            for failure in &report.failures {
                let _ = writeln!(output, "  - {}: {}", failure.field, failure.reason);
            }
        }

        output
    }

    fn format_formats_human(&self, formats: &[FormatInfo]) -> String {
        let mut output = String::new();

        output.push_str("Registered Formats\n");
        output.push_str(&rule());
        output.push_str("\n\n");

        for info in formats {
            let indent = "  ".repeat(info.depth);
            match info.specializes {
                Some(parent) => {
                    let _ = writeln!(output, "{}{} (specializes {})", indent, info.name, parent);
                }
                None => {
                    let _ = writeln!(output, "{}{}", indent, info.name);
                }
            }
        }

        output
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}

fn rule() -> String {
    "\u{2501}".repeat(42)
}

fn vector(v: &[f64; 3]) -> String {
    format!("({:.3}, {:.3}, {:.3})", v[0], v[1], v[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> FindReport {
        FindReport {
            path: "image.ser".to_string(),
            encoding: Encoding::Plain,
            format: Some("SER"),
            score: Some(1),
            error: None,
            candidates: vec![
                Candidate {
                    name: "SER",
                    depth: 0,
                    score: 1,
                },
                Candidate {
                    name: "SEReBIC",
                    depth: 1,
                    score: 0,
                },
            ],
        }
    }

    fn unresolved() -> FindReport {
        FindReport {
            path: "notes.txt".to_string(),
            encoding: Encoding::Plain,
            format: None,
            score: None,
            error: Some("No registered format understands notes.txt".to_string()),
            candidates: Vec::new(),
        }
    }

    fn instance_report() -> InstanceReport {
        InstanceReport {
            path: "image.ser".to_string(),
            format: "SER",
            num_images: 3,
            goniometer: None,
            detector: None,
            beam: Some(Beam {
                direction: [0.0, 0.0, 1.0],
                wavelength: 0.02508,
            }),
            scan: None,
            cube: None,
            start_error: None,
            failures: vec![FieldFailure {
                field: "detector",
                reason: "no geometry".to_string(),
            }],
        }
    }

    #[test]
    fn test_find_human() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_find(&[resolved(), unresolved()]).unwrap();

        assert!(output.contains("\u{2713} image.ser: SER (score 1, plain)"));
        assert!(output.contains("SEReBIC"));
        assert!(output.contains("\u{2717} notes.txt: No registered format"));
    }

    #[test]
    fn test_find_json() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_find(&[resolved(), unresolved()]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed[0]["format"], "SER");
        assert_eq!(parsed[0]["candidates"][1]["depth"], 1);
        assert!(parsed[1]["format"].is_null());
        assert!(parsed[1].get("candidates").is_none());
    }

    #[test]
    fn test_instance_yaml() {
        let formatter = OutputFormatter::new(OutputFormat::Yaml);
        let output = formatter.format_instance(&instance_report()).unwrap();

        assert!(output.contains("format: SER"));
        assert!(output.contains("wavelength: 0.02508"));
        assert!(output.contains("field: detector"));
    }

    #[test]
    fn test_instance_human() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_instance(&instance_report()).unwrap();

        assert!(output.contains("Format:      SER"));
        assert!(output.contains("Detector:   (not available)"));
        assert!(output.contains("wavelength 0.02508"));
        assert!(output.contains("- detector: no geometry"));
    }

    #[test]
    fn test_formats_human_indents_specializations() {
        let formats = vec![
            FormatInfo {
                name: "SER",
                specializes: None,
                depth: 0,
            },
            FormatInfo {
                name: "SEReBIC",
                specializes: Some("SER"),
                depth: 1,
            },
        ];
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_formats(&formats).unwrap();

        assert!(output.contains("\nSER\n"));
        assert!(output.contains("  SEReBIC (specializes SER)"));
    }
}
