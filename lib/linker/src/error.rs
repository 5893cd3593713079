use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("duplicate schema '{0}'")]
    DuplicateSchema(String),

    #[error(
        "schema '{schema}' failed validation with {} error(s): {}",
        errors.len(),
        errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Invalid {
        schema: String,
        errors: Vec<ValidationError>,
    },
}
