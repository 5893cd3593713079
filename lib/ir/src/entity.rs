//! Entity IR: fields, primary key and field modifiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::expr::{member_root, OolValue};
use crate::interface::InterfaceDef;
use crate::types::FieldType;

/// A named field-value transform applied before persistence.
///
/// The name may be dotted (`entity.modifier`) to reference another
/// entity's modifier. Object-reference arguments create dependency
/// edges used to order modifier application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<OolValue>,
}

impl Modifier {
    pub fn new(name: impl Into<String>, args: Vec<OolValue>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Roots of all object-reference arguments.
    pub fn reference_roots(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .filter_map(|a| a.ref_name())
            .map(member_root)
    }
}

/// A field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<OolValue>,

    /// Optional fields may be absent from input data.
    #[serde(default)]
    pub optional: bool,

    /// Auto-generated value (e.g. auto-increment key).
    #[serde(default)]
    pub auto: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

/// A schema-level data record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Ordered field definitions.
    pub fields: Vec<FieldDef>,

    /// Primary key field name.
    pub key: String,

    /// Field name → ordered modifier list, applied on create/update.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_modifiers: BTreeMap<String, Vec<Modifier>>,

    /// Named operations generated as model functions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub interfaces: BTreeMap<String, InterfaceDef>,

    /// Free-form modeling flags, copied into generated metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, OolValue>,
}

impl Entity {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary key field, if the key names an existing field.
    pub fn key_field(&self) -> Option<&FieldDef> {
        self.field(&self.key)
    }
}
