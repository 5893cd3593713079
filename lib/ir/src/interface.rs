//! Interface IR: named operations generated as model functions.
//!
//! An interface accepts parameters (optionally transformed by modifiers),
//! runs an operation sequence, and returns a value with optional
//! exceptional early-returns.

use serde::{Deserialize, Serialize};

use crate::entity::Modifier;
use crate::expr::{FilterExpr, OolValue};

/// An accepted parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,

    #[serde(default)]
    pub optional: bool,

    /// Modifiers applied to the parameter value, in order. Object-reference
    /// arguments may refer to values produced later in the body; application
    /// is deferred until the reference resolves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
}

/// One step of an interface implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    /// Query rows into a named context entry.
    Populate {
        /// Projected columns as `entity.field` / `entity.*` member paths.
        projection: Vec<String>,
        filter: FilterExpr,
        /// Context name the query result is bound to.
        output: String,
    },
    Update {
        target: String,
    },
    Create {
        target: String,
    },
    Delete {
        target: String,
    },
    /// Bind a value to a context name.
    Assignment {
        target: String,
        value: OolValue,
    },
}

/// An exceptional early-return, guarded by a test expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExceptionalReturn {
    #[serde(rename = "ConditionalStatement")]
    Conditional { test: FilterExpr, then: OolValue },
}

/// Return specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSpec {
    pub value: OolValue,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<ExceptionalReturn>,
}

/// A named operation with accepted parameters, an implementation
/// sequence and a return specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDef {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<ParamDef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implementation: Vec<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "return")]
    pub returns: Option<ReturnSpec>,
}
