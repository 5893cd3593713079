//! Oolong model generator
//!
//! Consumes a linked schema graph and produces source code:
//! - `ModelGenerator`: one data-access model module per entity per
//!   database deployment, plus modifier stub files
//! - `SqlSchemaGenerator`: CREATE TABLE migrations per entity
//!
//! Generation pipeline:
//! 1. `topo` orders field-modifier application so no modifier runs before
//!    the values it reads exist
//! 2. `sqlgen` translates filter expressions into parametrized SQL
//!    fragments, `guard` translates test expressions into boolean guards
//! 3. `ast` + `exporter` turn the per-entity module AST into source text

pub mod ast;
pub mod error;
pub mod exporter;
pub mod guard;
pub mod model;
pub mod names;
pub mod sql_schema;
pub mod sqlgen;
pub mod topo;

pub use error::CodegenError;
pub use exporter::{write_files, Exporter};
pub use model::ModelGenerator;
pub use sql_schema::SqlSchemaGenerator;

use oolong_ir::Schema;

/// Kind of a generated file; decides overwrite behavior when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Generated model module; always overwritten.
    Model,
    /// Modifier skeleton meant to be hand-filled; never overwritten.
    ModifierStub,
    /// SQL migration; always overwritten.
    Migration,
}

/// A generated file, path relative to the build directory.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    pub kind: FileKind,
}

/// Output of one generator run.
#[derive(Debug, Clone, Default)]
pub struct GeneratedCode {
    pub files: Vec<GeneratedFile>,
}

/// Code generator over a linked schema; implement one per target.
pub trait Generator {
    fn generate(&self, schema: &Schema) -> Result<GeneratedCode, CodegenError>;
    fn target(&self) -> &str;
}
