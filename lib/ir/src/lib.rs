//! Oolong schema IR
//!
//! In-memory schema graph produced by the linker and consumed by codegen:
//! - Schema: named entity collection plus database deployments
//! - Entity: fields, primary key, field modifiers, interfaces
//! - Expression: tagged value/filter trees (variables, object references,
//!   binary/unary expressions, literals)
//!
//! The JSON representation keeps the node convention of the schema
//! documents: every non-scalar node carries a `type` tag
//! (e.g. `{"type": "ObjectReference", "name": "existing.password"}`).

pub mod entity;
pub mod expr;
pub mod interface;
pub mod schema;
pub mod types;

pub use entity::*;
pub use expr::*;
pub use interface::*;
pub use schema::*;
pub use types::*;
