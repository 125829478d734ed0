//! Format registry
//!
//! Plugins are registered once, at startup, from an explicit list. Each entry
//! records the index of the plugin it specializes and its depth in that
//! specialization tree, both computed at registration time. Resolution only
//! reads the registry.

use super::{FormatError, FormatPlugin, RegistryError, SerEbicFormat, SerFormat};
use crate::config::DxformatConfig;
use crate::stream::StreamConfig;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

struct Entry {
    plugin: Arc<dyn FormatPlugin>,
    parent: Option<usize>,
    depth: usize,
}

/// A registered format and its place in the specialization tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatInfo {
    pub name: &'static str,
    pub specializes: Option<&'static str>,
    pub depth: usize,
}

/// Score given to a path by one registered format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: &'static str,
    pub depth: usize,
    pub score: u32,
}

/// Registry of image formats
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry holding every built-in format.
    pub fn with_defaults() -> Self {
        Self::with_stream_config(StreamConfig::default())
    }

    /// Built-in formats opening their files with `config`.
    pub fn with_stream_config(config: StreamConfig) -> Self {
        let mut registry = Self::new();
        for plugin in builtin_plugins(&config) {
            if let Err(e) = registry.register(plugin) {
                warn!(error = %e, "Skipping built-in format");
            }
        }
        registry
    }

    /// Append a plugin.
    ///
    /// The format it specializes must already be registered. Names are not
    /// deduplicated; a parent name resolves to its first registration.
    pub fn register(&mut self, plugin: Arc<dyn FormatPlugin>) -> Result<(), RegistryError> {
        let (parent, depth) = match plugin.specializes() {
            None => (None, 0),
            Some(parent_name) => {
                let idx = self.position(parent_name).ok_or(RegistryError::UnknownParent {
                    format: plugin.name(),
                    parent: parent_name,
                })?;
                (Some(idx), self.entries[idx].depth + 1)
            }
        };

        debug!(format = plugin.name(), depth, "Registered format");
        self.entries.push(Entry {
            plugin,
            parent,
            depth,
        });
        Ok(())
    }

    /// Resolve the best format for a path.
    ///
    /// The highest score wins. When several formats share it, a format is
    /// dropped if one of its specializations is also tied; the first
    /// registered of the remaining formats wins.
    pub fn find(&self, path: &Path) -> Result<&dyn FormatPlugin, FormatError> {
        self.find_scored(path).map(|(plugin, _)| plugin)
    }

    /// Like [`Registry::find`], also returning the winning score.
    pub fn find_scored(&self, path: &Path) -> Result<(&dyn FormatPlugin, u32), FormatError> {
        let (idx, score) = self.best_match(path)?;
        let plugin = self.entries[idx].plugin.as_ref();
        info!(path = %path.display(), format = plugin.name(), score, "Resolved format");
        Ok((plugin, score))
    }

    /// Like [`Registry::find`], but reject matches scoring below `min_score`.
    pub fn find_with_threshold(
        &self,
        path: &Path,
        min_score: u32,
    ) -> Result<&dyn FormatPlugin, FormatError> {
        let (idx, score) = self.best_match(path)?;
        let plugin = self.entries[idx].plugin.as_ref();
        if score < min_score {
            return Err(FormatError::BelowThreshold {
                path: path.to_path_buf(),
                format: plugin.name(),
                score,
                required: min_score,
            });
        }
        info!(path = %path.display(), format = plugin.name(), score, "Resolved format");
        Ok(plugin)
    }

    /// Score every registered format against a path, in registration order.
    pub fn rank(&self, path: &Path) -> Vec<Candidate> {
        self.entries
            .iter()
            .map(|entry| Candidate {
                name: entry.plugin.name(),
                depth: entry.depth,
                score: entry.plugin.understand(path),
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn FormatPlugin> {
        self.position(name)
            .map(|idx| self.entries[idx].plugin.as_ref())
    }

    pub fn formats(&self) -> impl Iterator<Item = FormatInfo> + '_ {
        self.entries.iter().map(|entry| FormatInfo {
            name: entry.plugin.name(),
            specializes: entry.parent.map(|p| self.entries[p].plugin.name()),
            depth: entry.depth,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.plugin.name() == name)
    }

    fn best_match(&self, path: &Path) -> Result<(usize, u32), FormatError> {
        let scores: Vec<u32> = self
            .entries
            .iter()
            .map(|entry| {
                let score = entry.plugin.understand(path);
                debug!(format = entry.plugin.name(), score, "Scored format");
                score
            })
            .collect();

        let best = scores.iter().copied().max().unwrap_or(0);
        if best == 0 {
            return Err(FormatError::Unrecognized {
                path: path.to_path_buf(),
            });
        }

        let tied: Vec<usize> = (0..scores.len()).filter(|&i| scores[i] == best).collect();

        // Parents always precede their specializations, so a tied format
        // without a tied specialization always exists.
        tied.iter()
            .copied()
            .find(|&candidate| {
                !tied
                    .iter()
                    .any(|&other| self.is_specialization_of(other, candidate))
            })
            .map(|idx| (idx, best))
            .ok_or_else(|| FormatError::Unrecognized {
                path: path.to_path_buf(),
            })
    }

    /// True if `candidate` refines `ancestor`, directly or transitively.
    fn is_specialization_of(&self, candidate: usize, ancestor: usize) -> bool {
        if self.entries[candidate].depth <= self.entries[ancestor].depth {
            return false;
        }

        let mut current = self.entries[candidate].parent;
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.entries[idx].parent;
        }
        false
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Built-in formats, parents before specializations.
fn builtin_plugins(config: &StreamConfig) -> Vec<Arc<dyn FormatPlugin>> {
    vec![
        Arc::new(SerFormat::new(config.clone())),
        Arc::new(SerEbicFormat::new(config.clone())),
    ]
}

/// Process-wide registry of the built-in formats, built on first use with
/// the stream settings from the environment.
pub fn shared() -> &'static Registry {
    static SHARED: OnceLock<Registry> = OnceLock::new();
    SHARED.get_or_init(|| {
        let config = DxformatConfig::default();
        let stream = match config.validate() {
            Ok(()) => config.stream_config(),
            Err(e) => {
                warn!(error = %e, "Using default stream settings");
                StreamConfig::default()
            }
        };
        Registry::with_stream_config(stream)
    })
}
