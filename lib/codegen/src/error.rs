use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("circular modifier dependency in entity '{entity}': {}", nodes.join(" -> "))]
    CircularDependency { entity: String, nodes: Vec<String> },

    #[error("unresolved reference '{name}' in {context}")]
    UnresolvedReference { name: String, context: String },

    #[error("unsupported data stage '{stage}' in {context}")]
    UnsupportedSource { stage: String, context: String },

    #[error("unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("unsupported value in filter: {0}")]
    UnsupportedValue(String),

    #[error("deployment '{deployment}' uses unsupported database type '{db_type}'")]
    UnsupportedDatabase { deployment: String, db_type: String },

    #[error("modifier name '{0}' nests too deep")]
    UnsupportedModifierPath(String),

    #[error("modifier alias '{0}' collides; rename one of the modifiers")]
    DuplicateModifierAlias(String),

    #[error("modifier '{modifier}' parameter '{name}' collides; rename the argument")]
    DuplicateStubParam { modifier: String, name: String },
}
