//! Oolong schema linker
//!
//! Loads schema documents (tagged JSON) into the IR graph and runs
//! cross-layer consistency checks before code generation:
//! - primary keys must name existing fields
//! - field modifiers must attach to existing fields
//! - modifier reference arguments must be rooted at a known data stage
//! - populate projections must be well-formed member paths
//!
//! Code generation consumes linked schemas only; an invalid schema never
//! reaches the generator.

pub mod error;
pub mod loader;
pub mod validate;

pub use error::LinkError;
pub use loader::{load_dir, load_file, load_str};
pub use validate::{validate_schema, ValidationError};

use std::collections::BTreeMap;
use std::path::Path;

use oolong_ir::Schema;
use tracing::debug;

/// Schema registry: collects loaded schemas, then links (validates) them
/// as a set.
#[derive(Debug, Default)]
pub struct Linker {
    schemas: BTreeMap<String, Schema>,
}

impl Linker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. Schema names must be unique.
    pub fn add(&mut self, schema: Schema) -> Result<(), LinkError> {
        if self.schemas.contains_key(&schema.name) {
            return Err(LinkError::DuplicateSchema(schema.name));
        }
        debug!(schema = %schema.name, "registered schema");
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Load a schema document file, or every `*.json` document in a
    /// directory, into the registry.
    pub fn load_path(&mut self, path: &Path) -> Result<(), LinkError> {
        if path.is_dir() {
            for schema in load_dir(path)? {
                self.add(schema)?;
            }
        } else {
            self.add(load_file(path)?)?;
        }
        Ok(())
    }

    /// Validate all registered schemas and yield the linked set.
    pub fn link(self) -> Result<BTreeMap<String, Schema>, LinkError> {
        for (name, schema) in &self.schemas {
            let errors = validate_schema(schema);
            if !errors.is_empty() {
                return Err(LinkError::Invalid {
                    schema: name.clone(),
                    errors,
                });
            }
            debug!(schema = %name, entities = schema.entities.len(), "linked schema");
        }
        Ok(self.schemas)
    }
}
