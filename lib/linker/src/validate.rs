//! Consistency checks across schema layers:
//! - primary key and field-modifier targets must exist in the entity
//! - modifier reference arguments must be rooted at a known data stage
//!   (`new`, `existing`, `raw`) or an entity field
//! - modifier names nest at most one entity deep
//! - interface parameters must be uniquely named
//! - populate projections must be `entity.field` / `entity.*` member paths

use oolong_ir::{is_member_access, member_path, Entity, Modifier, Operation, Schema};

/// Data stages a field-modifier argument may read from.
pub const DATA_STAGES: [&str; 3] = ["new", "existing", "raw"];

/// A validation error with a descriptive message.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
    /// Which layer produced the error (entity, modifier, interface).
    pub layer: String,
    /// Which entity/interface the error is about.
    pub context: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.layer, self.context, self.message)
    }
}

/// Validate an entire schema.
/// Returns all errors found (does not stop at first error).
pub fn validate_schema(schema: &Schema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (entity_name, entity) in &schema.entities {
        errors.extend(validate_entity(entity_name, entity));
    }

    errors
}

fn validate_entity(entity_name: &str, entity: &Entity) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Primary key must name an existing field.
    if entity.key_field().is_none() {
        errors.push(ValidationError {
            message: format!("primary key '{}' is not a field", entity.key),
            layer: "entity".into(),
            context: entity_name.into(),
        });
    }

    // Field modifiers must attach to existing fields.
    for (field_name, modifiers) in &entity.field_modifiers {
        if entity.field(field_name).is_none() {
            errors.push(ValidationError {
                message: format!("modifiers attached to unknown field '{}'", field_name),
                layer: "modifier".into(),
                context: entity_name.into(),
            });
        }

        for modifier in modifiers {
            errors.extend(validate_field_modifier(entity_name, entity, modifier));
        }
    }

    for (iface_name, iface) in &entity.interfaces {
        let ctx = format!("{}::{}", entity_name, iface_name);

        // Parameter names must be unique.
        for (i, param) in iface.accept.iter().enumerate() {
            if iface.accept[..i].iter().any(|p| p.name == param.name) {
                errors.push(ValidationError {
                    message: format!("duplicate parameter '{}'", param.name),
                    layer: "interface".into(),
                    context: ctx.clone(),
                });
            }
        }

        for op in &iface.implementation {
            if let Operation::Populate { projection, output, .. } = op {
                if output.is_empty() {
                    errors.push(ValidationError {
                        message: "populate output name is empty".into(),
                        layer: "interface".into(),
                        context: ctx.clone(),
                    });
                }
                for proj in projection {
                    let segments = member_path(proj);
                    if segments.len() != 2 || segments.iter().any(|s| s.is_empty()) {
                        errors.push(ValidationError {
                            message: format!(
                                "projection '{}' must be an entity.field or entity.* member path",
                                proj
                            ),
                            layer: "interface".into(),
                            context: ctx.clone(),
                        });
                    }
                }
            }
        }
    }

    errors
}

fn validate_field_modifier(
    entity_name: &str,
    entity: &Entity,
    modifier: &Modifier,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let ctx = format!("{}::{}", entity_name, modifier.name);

    // Dotted modifier names reference another entity's modifier; deeper
    // nesting is not supported.
    if member_path(&modifier.name).len() > 2 {
        errors.push(ValidationError {
            message: format!("modifier name '{}' nests too deep", modifier.name),
            layer: "modifier".into(),
            context: ctx.clone(),
        });
    }

    for arg in &modifier.args {
        let Some(name) = arg.ref_name() else {
            continue;
        };

        if is_member_access(name) {
            let root = member_path(name)[0];
            if !DATA_STAGES.contains(&root) {
                errors.push(ValidationError {
                    message: format!(
                        "reference '{}' is not rooted at a data stage ({})",
                        name,
                        DATA_STAGES.join(", ")
                    ),
                    layer: "modifier".into(),
                    context: ctx.clone(),
                });
            }
        } else if entity.field(name).is_none() {
            // Unqualified references read the new data stage and must
            // name an entity field.
            errors.push(ValidationError {
                message: format!("reference '{}' is not a field", name),
                layer: "modifier".into(),
                context: ctx.clone(),
            });
        }
    }

    errors
}
