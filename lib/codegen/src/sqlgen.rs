//! Filter-expression translation into parametrized SQL.
//!
//! Produces statements with the driver's two placeholder kinds: `??`
//! for identifiers (tables, columns) and `?` for values. Runtime-bound
//! values coming from object references are tracked as dependencies so
//! the caller can check they are in scope before emitting the query.

use oolong_ir::{member_path, member_root, BinaryOp, FilterExpr, OolValue, UnaryOp};

use crate::error::CodegenError;

/// A positional query argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    /// Bound to a `??` placeholder.
    Identifier(String),
    /// Column list bound to a single `??` placeholder.
    IdentifierList(Vec<String>),
    /// Bound to a `?` placeholder, resolved at runtime.
    Value(OolValue),
}

/// Translated WHERE fragment.
#[derive(Debug, Default)]
pub struct SqlFragment {
    pub statement: String,
    pub values: Vec<SqlArg>,
    /// Root names of object references the fragment binds at runtime.
    pub dependencies: Vec<String>,
}

impl SqlFragment {
    fn push_dependency(&mut self, name: &str) {
        let root = member_root(name).to_string();
        if !self.dependencies.contains(&root) {
            self.dependencies.push(root);
        }
    }
}

/// Translated SELECT statement with its argument list.
#[derive(Debug)]
pub struct SelectQuery {
    pub sql: String,
    pub args: Vec<SqlArg>,
    pub dependencies: Vec<String>,
}

fn binary_sql(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Gt => ">",
        BinaryOp::Lt => "<",
        BinaryOp::Ge => ">=",
        BinaryOp::Le => "<=",
        BinaryOp::Eq => "=",
        BinaryOp::Ne => "<>",
        BinaryOp::In => "in",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

fn translate_node(expr: &FilterExpr, out: &mut SqlFragment) -> Result<(), CodegenError> {
    match expr {
        FilterExpr::Binary {
            operator,
            left,
            right,
        } => {
            out.statement.push('(');
            translate_node(left, out)?;
            out.statement.push(' ');
            out.statement.push_str(binary_sql(*operator));
            out.statement.push(' ');
            translate_node(right, out)?;
            out.statement.push(')');
        }
        FilterExpr::Unary { operator, argument } => match operator {
            UnaryOp::Not => {
                out.statement.push_str("(NOT ");
                translate_node(argument, out)?;
                out.statement.push(')');
            }
            UnaryOp::Exists | UnaryOp::IsNotNull => {
                out.statement.push('(');
                translate_node(argument, out)?;
                out.statement.push_str(" IS NOT NULL)");
            }
            UnaryOp::NotExists | UnaryOp::IsNull => {
                out.statement.push('(');
                translate_node(argument, out)?;
                out.statement.push_str(" IS NULL)");
            }
        },
        FilterExpr::Value(value) => translate_value(value, out)?,
    }
    Ok(())
}

fn translate_value(value: &OolValue, out: &mut SqlFragment) -> Result<(), CodegenError> {
    match value {
        // entity column
        OolValue::Variable { name } => {
            out.statement.push_str("??");
            out.values.push(SqlArg::Identifier(name.clone()));
        }
        // value known only at runtime; bound when the query runs
        OolValue::ObjectRef { name } => {
            out.statement.push('?');
            out.values.push(SqlArg::Value(value.clone()));
            out.push_dependency(name);
        }
        OolValue::Literal(_) | OolValue::Array { .. } => {
            out.statement.push('?');
            out.values.push(SqlArg::Value(value.clone()));
        }
        OolValue::Object { .. } => {
            return Err(CodegenError::UnsupportedValue(
                "object literal in a filter".to_string(),
            ))
        }
    }
    Ok(())
}

/// Translate a filter expression into a WHERE fragment.
pub fn translate_filter(filter: &FilterExpr) -> Result<SqlFragment, CodegenError> {
    let mut out = SqlFragment::default();
    translate_node(filter, &mut out)?;
    Ok(out)
}

/// Build a full SELECT from a projection list and filter.
///
/// Projection entries are `entity.column` pairs (or `entity.*`); all
/// entries must target the same entity, joins are not supported here.
pub fn build_select(
    projection: &[String],
    filter: &FilterExpr,
) -> Result<SelectQuery, CodegenError> {
    let mut entity: Option<&str> = None;
    let mut columns: Vec<String> = Vec::new();
    let mut select_all = false;

    for entry in projection {
        let segments = member_path(entry);
        if segments.len() != 2 {
            return Err(CodegenError::UnsupportedProjection(entry.clone()));
        }
        match entity {
            None => entity = Some(segments[0]),
            Some(e) if e == segments[0] => {}
            Some(_) => {
                return Err(CodegenError::UnsupportedProjection(format!(
                    "'{}' spans multiple entities",
                    entry
                )))
            }
        }
        if segments[1] == "*" {
            select_all = true;
        } else {
            columns.push(segments[1].to_string());
        }
    }

    let entity = entity
        .ok_or_else(|| CodegenError::UnsupportedProjection("empty projection".to_string()))?;
    if select_all && !columns.is_empty() {
        return Err(CodegenError::UnsupportedProjection(format!(
            "'{}.*' mixed with named columns",
            entity
        )));
    }

    let fragment = translate_filter(filter)?;

    let mut sql = String::new();
    let mut args = Vec::new();
    if select_all {
        sql.push_str("SELECT * FROM ??");
    } else {
        sql.push_str("SELECT ?? FROM ??");
        args.push(SqlArg::IdentifierList(columns));
    }
    args.push(SqlArg::Identifier(entity.to_string()));

    if !fragment.statement.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&fragment.statement);
    }
    args.extend(fragment.values);

    Ok(SelectQuery {
        sql,
        args,
        dependencies: fragment.dependencies,
    })
}
