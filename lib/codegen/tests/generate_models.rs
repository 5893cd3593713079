//! End-to-end generation over a small user schema: modifier ordering in
//! `create`, deferred parameter modifiers around a populate, SQL
//! translation and migration output.

use oolong_codegen::{
    CodegenError, FileKind, GeneratedCode, GeneratedFile, Generator, ModelGenerator,
    SqlSchemaGenerator,
};
use oolong_ir::Schema;

fn user_schema() -> Schema {
    serde_json::from_str(
        r#"{
        "name": "levelup",
        "entities": {
            "user": {
                "fields": [
                    {"name": "id", "type": "int", "auto": true},
                    {"name": "email", "type": "text", "max_length": 200},
                    {"name": "mobile", "type": "text", "optional": true, "max_length": 20},
                    {"name": "password", "type": "text", "max_length": 200},
                    {"name": "password_salt", "type": "text", "optional": true, "max_length": 32}
                ],
                "key": "id",
                "field_modifiers": {
                    "password": [
                        {"name": "hashPassword", "args": [
                            {"type": "ObjectReference", "name": "password_salt"}
                        ]}
                    ],
                    "password_salt": [
                        {"name": "generateSalt", "args": [16]}
                    ]
                },
                "interfaces": {
                    "validate_user": {
                        "accept": [
                            {"name": "identity"},
                            {"name": "password", "modifiers": [
                                {"name": "hashPassword", "args": [
                                    {"type": "ObjectReference", "name": "user.password_salt"}
                                ]}
                            ]}
                        ],
                        "implementation": [
                            {
                                "type": "populate",
                                "projection": ["user.*"],
                                "filter": {
                                    "type": "BinaryExpression",
                                    "operator": "or",
                                    "left": {
                                        "type": "BinaryExpression",
                                        "operator": "=",
                                        "left": {"type": "Variable", "name": "email"},
                                        "right": {"type": "ObjectReference", "name": "identity"}
                                    },
                                    "right": {
                                        "type": "BinaryExpression",
                                        "operator": "=",
                                        "left": {"type": "Variable", "name": "mobile"},
                                        "right": {"type": "ObjectReference", "name": "identity"}
                                    }
                                },
                                "output": "user"
                            }
                        ],
                        "return": {
                            "value": {"type": "ObjectReference", "name": "user"},
                            "exceptions": [
                                {
                                    "type": "ConditionalStatement",
                                    "test": {
                                        "type": "UnaryExpression",
                                        "operator": "not-exists",
                                        "argument": {"type": "ObjectReference", "name": "user"}
                                    },
                                    "then": null
                                }
                            ]
                        }
                    }
                }
            }
        },
        "deployments": {
            "levelup": {"db_type": "mysql"}
        }
    }"#,
    )
    .expect("valid schema json")
}

fn file<'a>(code: &'a GeneratedCode, path: &str) -> &'a GeneratedFile {
    code.files
        .iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| {
            let paths: Vec<&str> = code.files.iter().map(|f| f.path.as_str()).collect();
            panic!("no file '{}', got {:?}", path, paths)
        })
}

#[test]
fn generates_model_and_stub_files() {
    let code = ModelGenerator::new().generate(&user_schema()).unwrap();

    let model = file(&code, "levelup/user.rs");
    assert_eq!(model.kind, FileKind::Model);

    let hash = file(&code, "levelup/modifiers/user_hash_password.rs");
    assert_eq!(hash.kind, FileKind::ModifierStub);
    assert!(hash
        .content
        .contains("pub fn hash_password(password: Value, password_salt: Value) -> Value {"));

    let salt = file(&code, "levelup/modifiers/user_generate_salt.rs");
    assert!(salt
        .content
        .contains("pub fn generate_salt(password_salt: Value, arg2: Value) -> Value {"));
}

#[test]
fn model_header_and_metadata() {
    let code = ModelGenerator::new().generate(&user_schema()).unwrap();
    let model = &file(&code, "levelup/user.rs").content;

    assert!(model.starts_with("// Model 'levelup.user' against deployment 'levelup'.\n"));
    assert!(model.contains("use oolong_runtime::prelude::*;"));
    assert!(model.contains("use super::modifiers::user_generate_salt::generate_salt;"));
    assert!(model.contains("use super::modifiers::user_hash_password::hash_password;"));
    assert!(model.contains("pub const MODEL_NAME: &str = \"user\";"));
    assert!(model.contains("pub const CONNECTION_ID: &str = \"mysql:levelup\";"));
    assert!(model.contains("pub const PRIMARY_KEY: &str = \"id\";"));
    assert!(model.contains("\"max_length\": 200"));
}

#[test]
fn create_applies_modifiers_in_dependency_order() {
    let code = ModelGenerator::new().generate(&user_schema()).unwrap();
    let model = &file(&code, "levelup/user.rs").content;

    assert!(model.contains(
        "let PreCreate { errors, warnings, mut new_data } = \
         model_pre_create(ctx, MODEL_NAME, &raw_data)?;"
    ));
    assert!(model.contains("return Err(ModelError::validation(errors, warnings, \"user.create\"));"));

    let salt_set = model
        .find("set(&mut new_data, \"password_salt\", generate_salt(get(&new_data, \"password_salt\"), 16))")
        .expect("salt application");
    let hash_set = model
        .find("set(&mut new_data, \"password\", hash_password(get(&new_data, \"password\"), get(&new_data, \"password_salt\")))")
        .expect("hash application");
    assert!(salt_set < hash_set, "salt must be generated before hashing");

    // the hash step guards its reference argument
    assert!(model.contains("if !has_value(&new_data, \"password_salt\") {"));
    assert!(model.contains("return Err(ModelError::reference_non_exist(\"password\"));"));
    assert!(model.contains("mysql_model_create(ctx, MODEL_NAME, &raw_data, new_data)"));
}

#[test]
fn interface_defers_modifier_until_populate_output() {
    let code = ModelGenerator::new().generate(&user_schema()).unwrap();
    let model = &file(&code, "levelup/user.rs").content;

    assert!(model.contains(
        "pub fn validate_user(ctx: &ModelContext, identity: Value, password: Value) \
         -> Result<Value, ModelError> {"
    ));
    assert!(model.contains("return Err(ModelError::missing_required(\"identity\"));"));
    assert!(model.contains("let db = ctx.connection(CONNECTION_ID)?;"));
    assert!(model
        .contains("let user_sql = \"SELECT * FROM ?? WHERE ((?? = ?) or (?? = ?))\";"));
    assert!(model.contains(
        "let user = db.query(user_sql, &[sql_ident(\"user\"), sql_ident(\"email\"), \
         sql_value(&identity), sql_ident(\"mobile\"), sql_value(&identity)])?;"
    ));

    let query = model.find("let user = db.query(").expect("populate query");
    let deferred = model
        .find("let password = hash_password(password, get(&user, \"password_salt\"));")
        .expect("deferred parameter modifier");
    assert!(query < deferred, "modifier must wait for the populate output");

    assert!(model.contains("if is_empty(&user) {"));
    assert!(model.contains("return Ok(Value::Null);"));
    assert!(model.contains("Ok(user)"));
}

#[test]
fn migration_output() {
    let code = SqlSchemaGenerator::new().generate(&user_schema()).unwrap();
    let migration = file(&code, "levelup/migrations/create_user.sql");
    assert_eq!(migration.kind, FileKind::Migration);
    assert!(migration.content.starts_with("CREATE TABLE IF NOT EXISTS `user` (\n"));
    assert!(migration.content.contains("`id` INT NOT NULL AUTO_INCREMENT"));
    assert!(migration.content.contains("PRIMARY KEY (`id`)"));
}

#[test]
fn modifier_cycle_is_rejected() {
    let mut schema = user_schema();
    let entity = schema.entities.get_mut("user").unwrap();
    entity.field_modifiers.insert(
        "email".to_string(),
        vec![oolong_ir::Modifier::new(
            "normalize",
            vec![oolong_ir::OolValue::object_ref("mobile")],
        )],
    );
    entity.field_modifiers.insert(
        "mobile".to_string(),
        vec![oolong_ir::Modifier::new(
            "normalize",
            vec![oolong_ir::OolValue::object_ref("email")],
        )],
    );

    let err = ModelGenerator::new().generate(&schema).unwrap_err();
    match err {
        CodegenError::CircularDependency { entity, nodes } => {
            assert_eq!(entity, "user");
            assert!(nodes.contains(&"new.email".to_string()));
            assert!(nodes.contains(&"new.mobile".to_string()));
        }
        other => panic!("expected cycle error, got {:?}", other),
    }
}

#[test]
fn unresolved_filter_reference_is_rejected() {
    let mut schema = user_schema();
    let entity = schema.entities.get_mut("user").unwrap();
    let iface = entity.interfaces.get_mut("validate_user").unwrap();
    if let oolong_ir::Operation::Populate { filter, .. } = &mut iface.implementation[0] {
        *filter = oolong_ir::FilterExpr::Binary {
            operator: oolong_ir::BinaryOp::Eq,
            left: Box::new(oolong_ir::FilterExpr::Value(oolong_ir::OolValue::Variable {
                name: "email".to_string(),
            })),
            right: Box::new(oolong_ir::FilterExpr::Value(oolong_ir::OolValue::object_ref(
                "missing",
            ))),
        };
    }

    let err = ModelGenerator::new().generate(&schema).unwrap_err();
    match err {
        CodegenError::UnresolvedReference { name, context } => {
            assert_eq!(name, "missing");
            assert_eq!(context, "user.validate_user");
        }
        other => panic!("expected unresolved reference, got {:?}", other),
    }
}

#[test]
fn parameter_modifier_stalled_on_unknown_output_is_rejected() {
    let mut schema = user_schema();
    let entity = schema.entities.get_mut("user").unwrap();
    let iface = entity.interfaces.get_mut("validate_user").unwrap();
    // reference a context name no operation ever produces; the deferred
    // modifier can never be applied
    iface.accept[1].modifiers[0].args[0] = oolong_ir::OolValue::object_ref("ghost.salt");

    let err = ModelGenerator::new().generate(&schema).unwrap_err();
    match err {
        CodegenError::UnresolvedReference { name, context } => {
            assert_eq!(name, "ghost");
            assert_eq!(context, "user.validate_user");
        }
        other => panic!("expected unresolved reference, got {:?}", other),
    }
}

#[test]
fn existing_stage_in_create_is_rejected() {
    let mut schema = user_schema();
    let entity = schema.entities.get_mut("user").unwrap();
    entity.field_modifiers.insert(
        "email".to_string(),
        vec![oolong_ir::Modifier::new(
            "normalize",
            vec![oolong_ir::OolValue::object_ref("existing.email")],
        )],
    );

    let err = ModelGenerator::new().generate(&schema).unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported data stage 'existing' in user.create"
    );
    match err {
        CodegenError::UnsupportedSource { stage, context } => {
            assert_eq!(stage, "existing");
            assert_eq!(context, "user.create");
        }
        other => panic!("expected unsupported stage, got {:?}", other),
    }
}

#[test]
fn mongodb_deployment_is_rejected() {
    let mut schema = user_schema();
    schema.deployments.insert(
        "cache".to_string(),
        oolong_ir::Deployment {
            db_type: oolong_ir::DbType::Mongodb,
            connection: None,
        },
    );

    let err = ModelGenerator::new().generate(&schema).unwrap_err();
    assert!(matches!(
        err,
        CodegenError::UnsupportedDatabase { deployment, db_type }
            if deployment == "cache" && db_type == "mongodb"
    ));
}
