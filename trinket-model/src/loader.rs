//! Loads layout definitions from a directory of JSON files.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{LayoutError, LayoutResult};
use crate::layout::SlotLayoutDefinition;

/// Outcome of loading a layout directory.
#[derive(Debug, Default)]
pub struct LoadedLayouts {
    /// Valid definitions, in file-name order.
    pub definitions: Vec<SlotLayoutDefinition>,
    /// Files (or entries within files) that were skipped.
    pub failures: Vec<(PathBuf, LayoutError)>,
}

/// Reads `*.json` layout files.
///
/// A file holds either one definition object or an array of them. A broken
/// definition is logged and skipped; it never aborts the rest of the reload.
pub struct LayoutLoader;

impl LayoutLoader {
    /// Loads every `*.json` file in `dir`. Fails only if the directory
    /// itself cannot be listed.
    pub fn load_dir(dir: &Path) -> LayoutResult<LoadedLayouts> {
        let entries = std::fs::read_dir(dir).map_err(|source| LayoutError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut loaded = LoadedLayouts::default();
        for path in files {
            Self::load_file_into(&path, &mut loaded);
        }
        debug!(
            "Loaded {} layout(s) from {} ({} skipped)",
            loaded.definitions.len(),
            dir.display(),
            loaded.failures.len()
        );
        Ok(loaded)
    }

    /// Parses one layout source (object or array of objects).
    pub fn parse_source(text: &str) -> Vec<LayoutResult<SlotLayoutDefinition>> {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Array(values)) => values
                .into_iter()
                .map(SlotLayoutDefinition::from_value)
                .collect(),
            Ok(value) => vec![SlotLayoutDefinition::from_value(value)],
            Err(e) => vec![Err(e.into())],
        }
    }

    fn load_file_into(path: &Path, loaded: &mut LoadedLayouts) {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) => {
                warn!("Skipping layout file {}: {}", path.display(), source);
                loaded.failures.push((
                    path.to_path_buf(),
                    LayoutError::Io {
                        path: path.to_path_buf(),
                        source,
                    },
                ));
                return;
            }
        };

        for result in Self::parse_source(&text) {
            match result {
                Ok(def) if loaded.definitions.iter().any(|d| d.key == def.key) => {
                    warn!(
                        "Duplicate layout for `{}` in {}; keeping the first one",
                        def.key,
                        path.display()
                    );
                }
                Ok(def) => loaded.definitions.push(def),
                Err(e) => {
                    warn!("Skipping layout in {}: {}", path.display(), e);
                    loaded.failures.push((path.to_path_buf(), e));
                }
            }
        }
    }
}
