//! Model module generation.
//!
//! Emits one data-access module per entity per database deployment, plus
//! skeleton files for the modifiers the entity references. A model module
//! carries the entity metadata, a `create` function that applies field
//! modifiers in dependency order before persisting, and one function per
//! declared interface.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use oolong_ir::{
    member_path, member_root, DbType, Deployment, Entity, ExceptionalReturn, FieldType, Modifier,
    OolValue, Operation, Schema,
};

use crate::ast::{self, Expr, Item, Module, Param, Stmt};
use crate::error::CodegenError;
use crate::exporter::Exporter;
use crate::guard::translate_test;
use crate::names::snake_case;
use crate::sqlgen::{build_select, SqlArg};
use crate::{FileKind, GeneratedCode, GeneratedFile, Generator};

/// Generates model modules and modifier stubs.
#[derive(Debug, Default)]
pub struct ModelGenerator {
    exporter: Exporter,
}

impl ModelGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Generator for ModelGenerator {
    fn generate(&self, schema: &Schema) -> Result<GeneratedCode, CodegenError> {
        let mut files = Vec::new();
        let mut stub_paths: BTreeSet<String> = BTreeSet::new();

        for (dep_name, deployment) in &schema.deployments {
            if deployment.db_type != DbType::Mysql {
                return Err(CodegenError::UnsupportedDatabase {
                    deployment: dep_name.clone(),
                    db_type: deployment.db_type.to_string(),
                });
            }

            for (entity_name, entity) in &schema.entities {
                debug!(schema = %schema.name, deployment = %dep_name, entity = %entity_name,
                    "generating model");

                let mut builder = ModelBuilder {
                    schema,
                    dep_name,
                    deployment,
                    entity_name,
                    entity,
                    modifiers: ModifierTable::new(entity_name),
                };
                let module = builder.build()?;

                for (module_name, stub) in builder.modifiers.stubs {
                    let path = format!("{}/modifiers/{}.rs", schema.name, module_name);
                    if stub_paths.insert(path.clone()) {
                        files.push(GeneratedFile {
                            path,
                            content: self.exporter.export(&stub),
                            kind: FileKind::ModifierStub,
                        });
                    }
                }

                files.push(GeneratedFile {
                    path: format!("{}/{}.rs", schema.name, entity_name),
                    content: self.exporter.export(&module),
                    kind: FileKind::Model,
                });
            }
        }

        Ok(GeneratedCode { files })
    }

    fn target(&self) -> &str {
        "models"
    }
}

/// A modifier bound to an importable function.
#[derive(Debug, Clone)]
struct ModifierBinding {
    /// Name the generated code calls.
    alias: String,
    /// Stub module under `modifiers/`.
    module: String,
    /// Function name inside the stub module.
    func: String,
}

/// Resolves modifier names to stub functions, one table per model module.
/// Keeps aliases unique so all imports can live at the top of the module.
#[derive(Debug)]
struct ModifierTable {
    entity: String,
    resolved: BTreeMap<String, ModifierBinding>,
    aliases: BTreeMap<String, String>,
    stubs: Vec<(String, Module)>,
}

impl ModifierTable {
    fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            resolved: BTreeMap::new(),
            aliases: BTreeMap::new(),
            stubs: Vec::new(),
        }
    }

    /// Resolve a modifier, creating its stub on first sight. `subject` is
    /// the field or parameter the modifier first applies to; it names the
    /// stub's leading parameter.
    fn resolve(&mut self, modifier: &Modifier, subject: &str) -> Result<ModifierBinding, CodegenError> {
        if let Some(binding) = self.resolved.get(&modifier.name) {
            return Ok(binding.clone());
        }

        let segments = member_path(&modifier.name);
        let (owner, func_raw) = match segments.len() {
            1 => (self.entity.as_str(), segments[0]),
            2 => (segments[0], segments[1]),
            _ => return Err(CodegenError::UnsupportedModifierPath(modifier.name.clone())),
        };

        let func = snake_case(func_raw);
        let module = format!("{}_{}", snake_case(owner), func);

        let mut alias = func.clone();
        if let Some(existing) = self.aliases.get(&alias) {
            if existing != &modifier.name {
                alias = module.clone();
            }
        }
        if let Some(existing) = self.aliases.get(&alias) {
            if existing != &modifier.name {
                return Err(CodegenError::DuplicateModifierAlias(alias));
            }
        }
        self.aliases.insert(alias.clone(), modifier.name.clone());

        let binding = ModifierBinding {
            alias,
            module: module.clone(),
            func: func.clone(),
        };
        self.stubs
            .push((module, stub_module(modifier, &func, subject)?));
        self.resolved
            .insert(modifier.name.clone(), binding.clone());
        Ok(binding)
    }

    fn import_items(&self) -> Vec<Item> {
        let mut uses: BTreeSet<String> = BTreeSet::new();
        for binding in self.resolved.values() {
            if binding.alias == binding.func {
                uses.insert(format!(
                    "super::modifiers::{}::{}",
                    binding.module, binding.func
                ));
            } else {
                uses.insert(format!(
                    "super::modifiers::{}::{} as {}",
                    binding.module, binding.func, binding.alias
                ));
            }
        }
        uses.into_iter().map(Item::Use).collect()
    }
}

/// Build the skeleton module for a modifier that has no implementation yet.
fn stub_module(modifier: &Modifier, func: &str, subject: &str) -> Result<Module, CodegenError> {
    let mut params = vec![Param {
        name: snake_case(subject),
        ty: "Value".to_string(),
    }];
    for (i, arg) in modifier.args.iter().enumerate() {
        let name = match arg.ref_name() {
            Some(name) => {
                let segments = member_path(name);
                snake_case(segments[segments.len() - 1])
            }
            None => format!("arg{}", i + 2),
        };
        if params.iter().any(|p| p.name == name) {
            return Err(CodegenError::DuplicateStubParam {
                modifier: modifier.name.clone(),
                name,
            });
        }
        params.push(Param {
            name,
            ty: "Value".to_string(),
        });
    }

    let first = params[0].name.clone();
    Ok(Module {
        header: vec![
            format!("Modifier skeleton for '{}'.", modifier.name),
            "Fill in the implementation; this file is never regenerated.".to_string(),
        ],
        items: vec![
            Item::Use("oolong_runtime::prelude::*".to_string()),
            Item::Fn {
                doc: Vec::new(),
                name: func.to_string(),
                params,
                ret: "Value".to_string(),
                body: vec![
                    Stmt::Comment("TODO: replace with a real implementation".to_string()),
                    Stmt::Tail(ast::ident(first)),
                ],
            },
        ],
    })
}

/// A parameter whose modifiers wait on values produced later in the body.
#[derive(Debug)]
struct QueueEntry {
    variable: String,
    pending: VecDeque<Modifier>,
}

struct ModelBuilder<'a> {
    schema: &'a Schema,
    dep_name: &'a str,
    deployment: &'a Deployment,
    entity_name: &'a str,
    entity: &'a Entity,
    modifiers: ModifierTable,
}

impl ModelBuilder<'_> {
    fn build(&mut self) -> Result<Module, CodegenError> {
        let mut functions = vec![self.build_fields_fn()];
        if !self.entity.flags.is_empty() {
            functions.push(self.build_flags_fn());
        }
        functions.push(self.build_create_fn()?);
        for (iface_name, iface) in &self.entity.interfaces {
            functions.push(self.build_interface_fn(iface_name, iface)?);
        }

        let mut items = vec![Item::Use("oolong_runtime::prelude::*".to_string())];
        items.extend(self.modifiers.import_items());
        items.push(Item::Const {
            name: "MODEL_NAME".to_string(),
            ty: "&str".to_string(),
            value: ast::str_lit(self.entity_name),
        });
        items.push(Item::Const {
            name: "CONNECTION_ID".to_string(),
            ty: "&str".to_string(),
            value: ast::str_lit(self.deployment.connection_id(self.dep_name)),
        });
        items.push(Item::Const {
            name: "PRIMARY_KEY".to_string(),
            ty: "&str".to_string(),
            value: ast::str_lit(&self.entity.key),
        });
        items.extend(functions);

        Ok(Module {
            header: vec![
                format!(
                    "Model '{}.{}' against deployment '{}'.",
                    self.schema.name, self.entity_name, self.dep_name
                ),
                "Generated by oolongc. Do not edit.".to_string(),
            ],
            items,
        })
    }

    fn build_fields_fn(&self) -> Item {
        let mut entries = Vec::new();
        for field in &self.entity.fields {
            let mut meta = vec![("type".to_string(), ast::str_lit(field.ty.name()))];
            if let FieldType::Enum(values) = &field.ty {
                meta.push((
                    "values".to_string(),
                    Expr::Array(values.iter().map(ast::str_lit).collect()),
                ));
            }
            if field.optional {
                meta.push(("optional".to_string(), Expr::Bool(true)));
            }
            if field.auto {
                meta.push(("auto".to_string(), Expr::Bool(true)));
            }
            if let Some(max_length) = field.max_length {
                meta.push(("max_length".to_string(), Expr::Int(i64::from(max_length))));
            }
            if let Some(default) = &field.default {
                meta.push(("default".to_string(), ast::value_expr(default)));
            }
            entries.push((field.name.clone(), Expr::Map(meta)));
        }

        Item::Fn {
            doc: vec!["Field metadata, keyed by field name.".to_string()],
            name: "fields".to_string(),
            params: Vec::new(),
            ret: "Value".to_string(),
            body: vec![Stmt::Tail(ast::json(Expr::Map(entries)))],
        }
    }

    fn build_flags_fn(&self) -> Item {
        let entries = self
            .entity
            .flags
            .iter()
            .map(|(k, v)| (k.clone(), ast::value_expr(v)))
            .collect();
        Item::Fn {
            doc: vec!["Modeling flags declared on the entity.".to_string()],
            name: "flags".to_string(),
            params: Vec::new(),
            ret: "Value".to_string(),
            body: vec![Stmt::Tail(ast::json(Expr::Map(entries)))],
        }
    }

    /// Order `new.*` values so each modifier runs after every value it
    /// reads. Every modified field gets a node even when its modifiers
    /// take no references, so none is dropped from the order.
    fn modifier_order(&self) -> Result<Vec<String>, CodegenError> {
        let mut graph = crate::topo::DependencyGraph::new();
        for (field, modifiers) in &self.entity.field_modifiers {
            let node = format!("new.{}", field);
            graph.add_node(&node);
            for modifier in modifiers {
                for arg in &modifier.args {
                    if let Some(name) = arg.ref_name() {
                        let segments = member_path(name);
                        let dep = if segments.len() > 1 {
                            format!("{}.{}", segments[0], segments[1])
                        } else {
                            format!("new.{}", segments[0])
                        };
                        graph.add_edge(&dep, &node);
                    }
                }
            }
        }

        graph.sort().map_err(|e| CodegenError::CircularDependency {
            entity: self.entity_name.to_string(),
            nodes: e.nodes,
        })
    }

    fn build_create_fn(&mut self) -> Result<Item, CodegenError> {
        let where_ = format!("{}.create", self.entity_name);
        let mut body = vec![
            Stmt::Let {
                pattern: "PreCreate { errors, warnings, mut new_data }".to_string(),
                value: ast::try_(ast::call(
                    "model_pre_create",
                    vec![
                        ast::ident("ctx"),
                        ast::ident("MODEL_NAME"),
                        ast::ref_(ast::ident("raw_data")),
                    ],
                )),
            },
            Stmt::If {
                cond: ast::not(ast::method(ast::ident("errors"), "is_empty", Vec::new())),
                then: vec![Stmt::Return(ast::call(
                    "Err",
                    vec![ast::call(
                        "ModelError::validation",
                        vec![
                            ast::ident("errors"),
                            ast::ident("warnings"),
                            ast::str_lit(&where_),
                        ],
                    )],
                ))],
                els: None,
            },
            Stmt::If {
                cond: ast::not(ast::method(ast::ident("warnings"), "is_empty", Vec::new())),
                then: vec![Stmt::Expr(ast::method(
                    ast::ident("ctx"),
                    "log_warnings",
                    vec![ast::ref_(ast::ident("warnings"))],
                ))],
                els: None,
            },
        ];

        for node in self.modifier_order()? {
            let (stage, field) = match node.split_once('.') {
                Some(parts) => parts,
                None => continue,
            };
            // existing/raw values are inputs here, nothing to apply
            if stage != "new" {
                continue;
            }
            let modifiers = match self.entity.field_modifiers.get(field) {
                Some(m) => m,
                None => continue,
            };

            let mut apply = Vec::new();
            for modifier in modifiers {
                let binding = self.modifiers.resolve(modifier, field)?;
                let mut args = vec![ast::get(ast::ident("new_data"), field)];
                for arg in &modifier.args {
                    args.push(self.create_arg_expr(field, arg, &mut apply, &where_)?);
                }
                apply.push(Stmt::Expr(ast::call(
                    "set",
                    vec![
                        ast::mut_ref(ast::ident("new_data")),
                        ast::str_lit(field),
                        ast::call(binding.alias, args),
                    ],
                )));
            }

            body.push(Stmt::If {
                cond: ast::has_value(ast::ident("new_data"), field),
                then: apply,
                els: None,
            });
        }

        body.push(Stmt::Tail(ast::call(
            "mysql_model_create",
            vec![
                ast::ident("ctx"),
                ast::ident("MODEL_NAME"),
                ast::ref_(ast::ident("raw_data")),
                ast::ident("new_data"),
            ],
        )));

        Ok(Item::Fn {
            doc: vec!["Validate and persist a new record.".to_string()],
            name: "create".to_string(),
            params: vec![
                Param {
                    name: "ctx".to_string(),
                    ty: "&ModelContext".to_string(),
                },
                Param {
                    name: "raw_data".to_string(),
                    ty: "Value".to_string(),
                },
            ],
            ret: "Result<Value, ModelError>".to_string(),
            body,
        })
    }

    /// Lower a modifier argument inside `create`, guarding reference
    /// arguments so a missing source value fails before the modifier runs.
    fn create_arg_expr(
        &self,
        field: &str,
        arg: &OolValue,
        guards: &mut Vec<Stmt>,
        where_: &str,
    ) -> Result<Expr, CodegenError> {
        let name = match arg.ref_name() {
            Some(name) => name,
            None => return Ok(ast::value_expr(arg)),
        };

        let segments = member_path(name);
        let (source, path) = if segments.len() > 1 {
            let source = match segments[0] {
                "new" => "new_data",
                "raw" => "raw_data",
                other => {
                    return Err(CodegenError::UnsupportedSource {
                        stage: other.to_string(),
                        context: where_.to_string(),
                    })
                }
            };
            (source, &segments[1..])
        } else {
            ("new_data", &segments[..])
        };

        guards.push(Stmt::If {
            cond: ast::not(ast::has_value(ast::ident(source), path[0])),
            then: vec![Stmt::Return(ast::call(
                "Err",
                vec![ast::call(
                    "ModelError::reference_non_exist",
                    vec![ast::str_lit(field)],
                )],
            ))],
            els: None,
        });

        let mut expr = ast::ident(source);
        for seg in path {
            expr = ast::get(expr, seg);
        }
        Ok(expr)
    }

    fn build_interface_fn(
        &mut self,
        iface_name: &str,
        iface: &oolong_ir::InterfaceDef,
    ) -> Result<Item, CodegenError> {
        let where_ = format!("{}.{}", self.entity_name, iface_name);
        let mut body = Vec::new();
        let mut context: BTreeSet<String> = BTreeSet::new();
        let mut queue: Vec<QueueEntry> = Vec::new();

        for param in &iface.accept {
            if !param.optional {
                body.push(Stmt::If {
                    cond: ast::call("is_nil", vec![ast::ref_(ast::ident(&param.name))]),
                    then: vec![Stmt::Return(ast::call(
                        "Err",
                        vec![ast::call(
                            "ModelError::missing_required",
                            vec![ast::str_lit(&param.name)],
                        )],
                    ))],
                    els: None,
                });
            }
            context.insert(param.name.clone());
        }

        // apply parameter modifiers now when their references already
        // resolve; the rest wait for the body to produce the values
        for param in &iface.accept {
            let mut pending = VecDeque::new();
            for modifier in &param.modifiers {
                if pending.is_empty() && refs_resolved(modifier, &context) {
                    self.apply_param_modifier(&param.name, modifier, &mut body)?;
                } else {
                    pending.push_back(modifier.clone());
                }
            }
            if !pending.is_empty() {
                queue.push(QueueEntry {
                    variable: param.name.clone(),
                    pending,
                });
            }
        }

        let mut db_ready = false;
        for op in &iface.implementation {
            match op {
                Operation::Populate {
                    projection,
                    filter,
                    output,
                } => {
                    ensure_db(&mut body, &mut db_ready);
                    let query = build_select(projection, filter)?;
                    for dep in &query.dependencies {
                        if !context.contains(dep) {
                            return Err(CodegenError::UnresolvedReference {
                                name: dep.clone(),
                                context: where_.clone(),
                            });
                        }
                    }

                    let sql_var = format!("{}_sql", output);
                    body.push(Stmt::Let {
                        pattern: sql_var.clone(),
                        value: ast::str_lit(&query.sql),
                    });
                    let args: Vec<Expr> = query.args.iter().map(sql_arg_expr).collect();
                    body.push(Stmt::Let {
                        pattern: output.clone(),
                        value: ast::try_(ast::method(
                            ast::ident("db"),
                            "query",
                            vec![ast::ident(sql_var), ast::ref_(Expr::Array(args))],
                        )),
                    });
                    context.insert(output.clone());
                    self.drain_queue(&context, &mut queue, &mut body)?;
                }
                Operation::Update { target }
                | Operation::Create { target }
                | Operation::Delete { target } => {
                    ensure_db(&mut body, &mut db_ready);
                    let kind = match op {
                        Operation::Update { .. } => "update",
                        Operation::Delete { .. } => "delete",
                        _ => "create",
                    };
                    body.push(Stmt::Comment(format!(
                        "TODO: emit the {} call for '{}'",
                        kind, target
                    )));
                }
                Operation::Assignment { target, value } => {
                    if let Some(name) = value.ref_name() {
                        let root = member_root(name);
                        if !context.contains(root) {
                            return Err(CodegenError::UnresolvedReference {
                                name: name.to_string(),
                                context: where_.clone(),
                            });
                        }
                    }
                    body.push(Stmt::Let {
                        pattern: target.clone(),
                        value: ast::value_expr(value),
                    });
                    context.insert(target.clone());
                    self.drain_queue(&context, &mut queue, &mut body)?;
                }
            }
        }

        if let Some(entry) = queue.first() {
            let name = entry
                .pending
                .front()
                .and_then(|m| m.reference_roots().find(|r| !context.contains(*r)))
                .unwrap_or(entry.variable.as_str())
                .to_string();
            return Err(CodegenError::UnresolvedReference {
                name,
                context: where_,
            });
        }

        match &iface.returns {
            Some(ret) => {
                for ExceptionalReturn::Conditional { test, then } in &ret.exceptions {
                    body.push(Stmt::If {
                        cond: translate_test(&context, test, &where_)?,
                        then: vec![Stmt::Return(ast::call(
                            "Ok",
                            vec![ast::value_expr(then)],
                        ))],
                        els: None,
                    });
                }
                if let Some(name) = ret.value.ref_name() {
                    let root = member_root(name);
                    if !context.contains(root) {
                        return Err(CodegenError::UnresolvedReference {
                            name: name.to_string(),
                            context: where_,
                        });
                    }
                }
                body.push(Stmt::Tail(ast::call("Ok", vec![ast::value_expr(&ret.value)])));
            }
            None => body.push(Stmt::Tail(ast::call("Ok", vec![Expr::Null]))),
        }

        let mut params = vec![Param {
            name: "ctx".to_string(),
            ty: "&ModelContext".to_string(),
        }];
        params.extend(iface.accept.iter().map(|p| Param {
            name: p.name.clone(),
            ty: "Value".to_string(),
        }));

        Ok(Item::Fn {
            doc: Vec::new(),
            name: iface_name.to_string(),
            params,
            ret: "Result<Value, ModelError>".to_string(),
            body,
        })
    }

    fn apply_param_modifier(
        &mut self,
        variable: &str,
        modifier: &Modifier,
        body: &mut Vec<Stmt>,
    ) -> Result<(), CodegenError> {
        let binding = self.modifiers.resolve(modifier, variable)?;
        let mut args = vec![ast::ident(variable)];
        args.extend(modifier.args.iter().map(ast::value_expr));
        body.push(Stmt::Let {
            pattern: variable.to_string(),
            value: ast::call(binding.alias, args),
        });
        Ok(())
    }

    /// Apply every queued modifier whose references now resolve. Repeats
    /// until a full pass makes no progress.
    fn drain_queue(
        &mut self,
        context: &BTreeSet<String>,
        queue: &mut Vec<QueueEntry>,
        body: &mut Vec<Stmt>,
    ) -> Result<(), CodegenError> {
        loop {
            let mut progressed = false;
            for entry in queue.iter_mut() {
                while entry
                    .pending
                    .front()
                    .is_some_and(|m| refs_resolved(m, context))
                {
                    if let Some(modifier) = entry.pending.pop_front() {
                        self.apply_param_modifier(&entry.variable, &modifier, body)?;
                        progressed = true;
                    }
                }
            }
            queue.retain(|e| !e.pending.is_empty());
            if !progressed {
                return Ok(());
            }
        }
    }
}

/// Bind the deployment connection once per function body.
fn ensure_db(body: &mut Vec<Stmt>, ready: &mut bool) {
    if !*ready {
        body.push(Stmt::Let {
            pattern: "db".to_string(),
            value: ast::try_(ast::method(
                ast::ident("ctx"),
                "connection",
                vec![ast::ident("CONNECTION_ID")],
            )),
        });
        *ready = true;
    }
}

fn refs_resolved(modifier: &Modifier, context: &BTreeSet<String>) -> bool {
    modifier.reference_roots().all(|r| context.contains(r))
}

fn sql_arg_expr(arg: &SqlArg) -> Expr {
    match arg {
        SqlArg::Identifier(name) => ast::call("sql_ident", vec![ast::str_lit(name)]),
        SqlArg::IdentifierList(cols) => ast::call(
            "sql_ident_list",
            vec![ast::ref_(Expr::Array(
                cols.iter().map(ast::str_lit).collect(),
            ))],
        ),
        SqlArg::Value(value) => ast::call("sql_value", vec![ast::ref_(ast::value_expr(value))]),
    }
}
