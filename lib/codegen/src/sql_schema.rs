//! CREATE TABLE migration generation.

use tracing::debug;

use oolong_ir::{DbType, Entity, FieldDef, FieldType, Literal, OolValue, Schema};

use crate::error::CodegenError;
use crate::{FileKind, GeneratedCode, GeneratedFile, Generator};

/// Emits one migration file per entity per database deployment.
#[derive(Debug, Default)]
pub struct SqlSchemaGenerator;

impl SqlSchemaGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for SqlSchemaGenerator {
    fn generate(&self, schema: &Schema) -> Result<GeneratedCode, CodegenError> {
        let mut files = Vec::new();

        for (dep_name, deployment) in &schema.deployments {
            if deployment.db_type != DbType::Mysql {
                return Err(CodegenError::UnsupportedDatabase {
                    deployment: dep_name.clone(),
                    db_type: deployment.db_type.to_string(),
                });
            }

            for (entity_name, entity) in &schema.entities {
                debug!(deployment = %dep_name, entity = %entity_name, "generating migration");
                files.push(GeneratedFile {
                    path: format!("{}/migrations/create_{}.sql", dep_name, entity_name),
                    content: create_table(entity_name, entity),
                    kind: FileKind::Migration,
                });
            }
        }

        Ok(GeneratedCode { files })
    }

    fn target(&self) -> &str {
        "sql"
    }
}

fn create_table(entity_name: &str, entity: &Entity) -> String {
    let mut lines = Vec::with_capacity(entity.fields.len() + 1);
    for field in &entity.fields {
        lines.push(column_def(field));
    }
    lines.push(format!("  PRIMARY KEY (`{}`)", entity.key));

    format!(
        "CREATE TABLE IF NOT EXISTS `{}` (\n{}\n);\n",
        entity_name,
        lines.join(",\n")
    )
}

fn column_def(field: &FieldDef) -> String {
    let mut def = format!("  `{}` {}", field.name, column_type(field));
    if !field.optional {
        def.push_str(" NOT NULL");
    }
    if field.auto && field.ty == FieldType::Int {
        def.push_str(" AUTO_INCREMENT");
    }
    if let Some(default) = field.default.as_ref().and_then(default_sql) {
        def.push_str(" DEFAULT ");
        def.push_str(&default);
    }
    def
}

fn column_type(field: &FieldDef) -> String {
    match &field.ty {
        FieldType::Int => "INT".to_string(),
        FieldType::Float => "DOUBLE".to_string(),
        FieldType::Bool => "TINYINT(1)".to_string(),
        FieldType::Text => match field.max_length {
            Some(n) => format!("VARCHAR({})", n),
            None => "TEXT".to_string(),
        },
        FieldType::Datetime => "DATETIME".to_string(),
        FieldType::Binary => "BLOB".to_string(),
        FieldType::Json => "JSON".to_string(),
        FieldType::Enum(values) => {
            let values: Vec<String> = values
                .iter()
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect();
            format!("ENUM({})", values.join(", "))
        }
    }
}

/// Literal defaults only; computed defaults are applied by the model layer.
fn default_sql(value: &OolValue) -> Option<String> {
    match value {
        OolValue::Literal(Literal::Bool(b)) => Some(if *b { "1" } else { "0" }.to_string()),
        OolValue::Literal(Literal::Int(i)) => Some(i.to_string()),
        OolValue::Literal(Literal::Float(f)) => Some(format!("{:?}", f)),
        OolValue::Literal(Literal::String(s)) => Some(format!("'{}'", s.replace('\'', "''"))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn field(name: &str, ty: FieldType) -> FieldDef {
        FieldDef {
            name: name.into(),
            ty,
            default: None,
            optional: false,
            auto: false,
            max_length: None,
        }
    }

    #[test]
    fn user_table_ddl() {
        let entity = Entity {
            fields: vec![
                FieldDef {
                    auto: true,
                    ..field("id", FieldType::Int)
                },
                FieldDef {
                    max_length: Some(200),
                    ..field("email", FieldType::Text)
                },
                FieldDef {
                    optional: true,
                    default: Some(OolValue::str("active")),
                    ..field("status", FieldType::Enum(vec!["active".into(), "disabled".into()]))
                },
                FieldDef {
                    optional: true,
                    ..field("profile", FieldType::Json)
                },
            ],
            key: "id".into(),
            field_modifiers: BTreeMap::new(),
            interfaces: BTreeMap::new(),
            flags: BTreeMap::new(),
        };

        let ddl = create_table("user", &entity);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS `user` (\n"));
        assert!(ddl.contains("  `id` INT NOT NULL AUTO_INCREMENT,\n"));
        assert!(ddl.contains("  `email` VARCHAR(200) NOT NULL,\n"));
        assert!(ddl.contains("  `status` ENUM('active', 'disabled') DEFAULT 'active',\n"));
        assert!(ddl.contains("  `profile` JSON,\n"));
        assert!(ddl.ends_with("  PRIMARY KEY (`id`)\n);\n"));
    }

    #[test]
    fn quotes_in_enum_values_are_doubled() {
        let f = field("kind", FieldType::Enum(vec!["it's".into()]));
        assert_eq!(column_type(&f), "ENUM('it''s')");
    }
}
