//! Shared scalar types used across the schema graph.

use serde::{Deserialize, Serialize};

/// Field value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int,
    Float,
    Bool,
    Text,
    Datetime,
    Binary,
    Json,
    /// Enumerated text values.
    Enum(Vec<String>),
}

impl FieldType {
    /// Name used in generated field metadata.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Text => "text",
            FieldType::Datetime => "datetime",
            FieldType::Binary => "binary",
            FieldType::Json => "json",
            FieldType::Enum(_) => "enum",
        }
    }
}

/// Database type of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Mysql,
    Mongodb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::Mysql => write!(f, "mysql"),
            DbType::Mongodb => write!(f, "mongodb"),
        }
    }
}
