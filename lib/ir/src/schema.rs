//! Schema IR: the top-level graph node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::types::DbType;

/// A database deployment a schema is generated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub db_type: DbType,

    /// Connection string, resolved by the host at runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
}

impl Deployment {
    /// Service connection id for a deployment named `name`.
    pub fn connection_id(&self, name: &str) -> String {
        format!("{}:{}", self.db_type, name)
    }
}

/// A named collection of entities plus deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,

    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,

    #[serde(default)]
    pub deployments: BTreeMap<String, Deployment>,
}

impl Schema {
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }
}
