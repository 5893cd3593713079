//! AST-to-source exporter and generated-file writer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ast::{Expr, Item, Module, Stmt};
use crate::{FileKind, GeneratedCode};

/// Source formatting options.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub indent: String,
    pub newline: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            newline: "\n".to_string(),
        }
    }
}

/// Renders a module AST to source text.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn export(&self, module: &Module) -> String {
        let nl = &self.options.newline;
        let mut out = String::new();

        for line in &module.header {
            out.push_str("// ");
            out.push_str(line);
            out.push_str(nl);
        }
        if !module.header.is_empty() {
            out.push_str(nl);
        }

        let mut prev: Option<&Item> = None;
        for item in &module.items {
            if let Some(p) = prev {
                // keep use/const groups tight, blank line elsewhere
                let grouped = matches!((p, item), (Item::Use(_), Item::Use(_)))
                    || matches!((p, item), (Item::Const { .. }, Item::Const { .. }));
                if !grouped {
                    out.push_str(nl);
                }
            }
            self.write_item(&mut out, item);
            prev = Some(item);
        }

        out
    }

    fn write_item(&self, out: &mut String, item: &Item) {
        let nl = &self.options.newline;
        match item {
            Item::Use(path) => {
                out.push_str(&format!("use {};{}", path, nl));
            }
            Item::Const { name, ty, value } => {
                out.push_str(&format!(
                    "pub const {}: {} = {};{}",
                    name,
                    ty,
                    self.expr(value, false, 0),
                    nl
                ));
            }
            Item::Fn {
                doc,
                name,
                params,
                ret,
                body,
            } => {
                for line in doc {
                    out.push_str(&format!("/// {}{}", line, nl));
                }
                let params: Vec<String> =
                    params.iter().map(|p| format!("{}: {}", p.name, p.ty)).collect();
                out.push_str(&format!(
                    "pub fn {}({}) -> {} {{{}",
                    name,
                    params.join(", "),
                    ret,
                    nl
                ));
                self.write_block(out, body, 1);
                out.push_str(&format!("}}{}", nl));
            }
        }
    }

    fn write_block(&self, out: &mut String, stmts: &[Stmt], level: usize) {
        for stmt in stmts {
            self.write_stmt(out, stmt, level);
        }
    }

    fn write_stmt(&self, out: &mut String, stmt: &Stmt, level: usize) {
        let nl = &self.options.newline;
        let pad = self.options.indent.repeat(level);
        match stmt {
            Stmt::Let { pattern, value } => {
                out.push_str(&format!(
                    "{}let {} = {};{}",
                    pad,
                    pattern,
                    self.expr(value, false, level),
                    nl
                ));
            }
            Stmt::If { cond, then, els } => {
                out.push_str(&format!("{}if {} {{{}", pad, self.expr(cond, false, level), nl));
                self.write_block(out, then, level + 1);
                match els {
                    Some(els) => {
                        out.push_str(&format!("{}}} else {{{}", pad, nl));
                        self.write_block(out, els, level + 1);
                        out.push_str(&format!("{}}}{}", pad, nl));
                    }
                    None => out.push_str(&format!("{}}}{}", pad, nl)),
                }
            }
            Stmt::Return(e) => {
                out.push_str(&format!("{}return {};{}", pad, self.expr(e, false, level), nl));
            }
            Stmt::Tail(e) => {
                out.push_str(&format!("{}{}{}", pad, self.expr(e, false, level), nl));
            }
            Stmt::Expr(e) => {
                out.push_str(&format!("{}{};{}", pad, self.expr(e, false, level), nl));
            }
            Stmt::Comment(text) => {
                out.push_str(&format!("{}// {}{}", pad, text, nl));
            }
        }
    }

    fn expr(&self, e: &Expr, json_ctx: bool, level: usize) -> String {
        match e {
            Expr::Ident(name) => name.clone(),
            Expr::Str(s) => format!("\"{}\"", escape_str(s)),
            Expr::Int(i) => i.to_string(),
            Expr::Float(f) => format!("{:?}", f),
            Expr::Bool(b) => b.to_string(),
            Expr::Null => {
                if json_ctx {
                    "null".to_string()
                } else {
                    "Value::Null".to_string()
                }
            }
            Expr::Array(items) => {
                let items: Vec<String> =
                    items.iter().map(|i| self.expr(i, json_ctx, level)).collect();
                format!("[{}]", items.join(", "))
            }
            Expr::Map(entries) => self.map_literal(entries, level),
            Expr::Json(inner) => {
                if json_ctx {
                    self.expr(inner, true, level)
                } else {
                    format!("json!({})", self.expr(inner, true, level))
                }
            }
            Expr::Call { func, args } => {
                let args: Vec<String> =
                    args.iter().map(|a| self.expr(a, false, level)).collect();
                format!("{}({})", func, args.join(", "))
            }
            Expr::MethodCall { recv, method, args } => {
                let args: Vec<String> =
                    args.iter().map(|a| self.expr(a, false, level)).collect();
                format!(
                    "{}.{}({})",
                    self.expr(recv, false, level),
                    method,
                    args.join(", ")
                )
            }
            Expr::Binary { op, left, right } => format!(
                "({} {} {})",
                self.expr(left, json_ctx, level),
                op,
                self.expr(right, json_ctx, level)
            ),
            Expr::Not(inner) => format!("!{}", self.expr(inner, false, level)),
            Expr::Try(inner) => format!("{}?", self.expr(inner, false, level)),
            Expr::Ref(inner) => format!("&{}", self.expr(inner, false, level)),
            Expr::MutRef(inner) => format!("&mut {}", self.expr(inner, false, level)),
        }
    }

    fn map_literal(&self, entries: &[(String, Expr)], level: usize) -> String {
        if entries.len() <= 2 {
            let entries: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("\"{}\": {}", escape_str(k), self.expr(v, true, level)))
                .collect();
            return format!("{{{}}}", entries.join(", "));
        }

        let nl = &self.options.newline;
        let inner_pad = self.options.indent.repeat(level + 1);
        let pad = self.options.indent.repeat(level);
        let entries: Vec<String> = entries
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}\"{}\": {}",
                    inner_pad,
                    escape_str(k),
                    self.expr(v, true, level + 1)
                )
            })
            .collect();
        format!("{{{}{}{}{}}}", nl, entries.join(&format!(",{}", nl)), nl, pad)
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Persist generated files under `out_dir`, creating parent directories.
/// Modifier stubs that already exist on disk are left untouched; they are
/// meant to be hand-filled after the first generation.
pub fn write_files(code: &GeneratedCode, out_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for file in &code.files {
        let path = out_dir.join(&file.path);
        if file.kind == FileKind::ModifierStub && path.exists() {
            debug!(path = %path.display(), "modifier stub exists, skipping");
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.content)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{self, Param};
    use crate::GeneratedFile;

    #[test]
    fn exports_function_item() {
        let module = Module {
            header: vec!["Generated by oolongc. Do not edit.".into()],
            items: vec![
                Item::Use("oolong_runtime::prelude::*".into()),
                Item::Const {
                    name: "MODEL_NAME".into(),
                    ty: "&str".into(),
                    value: ast::str_lit("user"),
                },
                Item::Fn {
                    doc: vec!["Validate a login.".into()],
                    name: "validate_user".into(),
                    params: vec![Param {
                        name: "identity".into(),
                        ty: "Value".into(),
                    }],
                    ret: "Result<Value, ModelError>".into(),
                    body: vec![
                        Stmt::If {
                            cond: ast::call("is_nil", vec![ast::ref_(ast::ident("identity"))]),
                            then: vec![Stmt::Return(ast::call(
                                "Err",
                                vec![ast::call(
                                    "ModelError::missing_required",
                                    vec![ast::str_lit("identity")],
                                )],
                            ))],
                            els: None,
                        },
                        Stmt::Tail(ast::call("Ok", vec![ast::ident("identity")])),
                    ],
                },
            ],
        };

        let source = Exporter::default().export(&module);
        assert!(source.starts_with("// Generated by oolongc. Do not edit.\n"));
        assert!(source.contains("pub const MODEL_NAME: &str = \"user\";"));
        assert!(source.contains("pub fn validate_user(identity: Value) -> Result<Value, ModelError> {"));
        assert!(source.contains("    if is_nil(&identity) {"));
        assert!(source
            .contains("        return Err(ModelError::missing_required(\"identity\"));"));
        assert!(source.ends_with("    Ok(identity)\n}\n"));
    }

    #[test]
    fn binary_expressions_are_parenthesized() {
        let e = ast::binary(
            "&&",
            ast::binary("==", ast::ident("a"), ast::ident("b")),
            ast::not(ast::call("is_empty", vec![ast::ref_(ast::ident("c"))])),
        );
        let rendered = Exporter::default().expr(&e, false, 0);
        assert_eq!(rendered, "((a == b) && !is_empty(&c))");
    }

    #[test]
    fn json_wrapper_renders_once() {
        let e = ast::json(Expr::Map(vec![
            ("optional".into(), Expr::Bool(true)),
            ("default".into(), Expr::Null),
        ]));
        let rendered = Exporter::default().expr(&e, false, 0);
        assert_eq!(rendered, "json!({\"optional\": true, \"default\": null})");
    }

    #[test]
    fn writer_skips_existing_stubs() {
        let dir = tempfile::tempdir().unwrap();
        let code = GeneratedCode {
            files: vec![GeneratedFile {
                path: "app/modifiers/user_hash_password.rs".into(),
                content: "// stub v1\n".into(),
                kind: FileKind::ModifierStub,
            }],
        };

        let written = write_files(&code, dir.path()).unwrap();
        assert_eq!(written.len(), 1);

        // second run must not clobber the (possibly hand-edited) stub
        let code2 = GeneratedCode {
            files: vec![GeneratedFile {
                path: "app/modifiers/user_hash_password.rs".into(),
                content: "// stub v2\n".into(),
                kind: FileKind::ModifierStub,
            }],
        };
        let written = write_files(&code2, dir.path()).unwrap();
        assert!(written.is_empty());

        let kept =
            fs::read_to_string(dir.path().join("app/modifiers/user_hash_password.rs")).unwrap();
        assert_eq!(kept, "// stub v1\n");
    }

    #[test]
    fn writer_overwrites_models() {
        let dir = tempfile::tempdir().unwrap();
        let model = |content: &str| GeneratedCode {
            files: vec![GeneratedFile {
                path: "app/user.rs".into(),
                content: content.into(),
                kind: FileKind::Model,
            }],
        };

        write_files(&model("// v1\n"), dir.path()).unwrap();
        write_files(&model("// v2\n"), dir.path()).unwrap();
        let kept = fs::read_to_string(dir.path().join("app/user.rs")).unwrap();
        assert_eq!(kept, "// v2\n");
    }
}
