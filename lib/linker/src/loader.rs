//! Schema document loading.
//!
//! A schema document is one JSON file holding one schema graph, using the
//! tagged node convention of `oolong-ir`.

use std::fs;
use std::path::Path;

use oolong_ir::Schema;

use crate::error::LinkError;

/// Parse a schema document from a string.
pub fn load_str(src: &str) -> Result<Schema, LinkError> {
    serde_json::from_str(src).map_err(|source| LinkError::Parse {
        path: "<inline>".to_string(),
        source,
    })
}

/// Load a schema document from a file.
pub fn load_file(path: &Path) -> Result<Schema, LinkError> {
    let src = fs::read_to_string(path)?;
    serde_json::from_str(&src).map_err(|source| LinkError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load every `*.json` schema document in a directory, sorted by file name.
pub fn load_dir(dir: &Path) -> Result<Vec<Schema>, LinkError> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut schemas = Vec::with_capacity(paths.len());
    for path in paths {
        schemas.push(load_file(&path)?);
    }
    Ok(schemas)
}
