//! Test-expression translation into boolean guard expressions.
//!
//! Used for exceptional-return conditions: the test runs in generated
//! code against values already in scope, so every object reference must
//! resolve to a context variable.

use std::collections::BTreeSet;

use oolong_ir::{member_root, BinaryOp, FilterExpr, OolValue, UnaryOp};

use crate::ast::{self, Expr};
use crate::error::CodegenError;

fn binary_guard(op: BinaryOp) -> Option<&'static str> {
    match op {
        BinaryOp::Gt => Some(">"),
        BinaryOp::Lt => Some("<"),
        BinaryOp::Ge => Some(">="),
        BinaryOp::Le => Some("<="),
        BinaryOp::Eq => Some("=="),
        BinaryOp::Ne => Some("!="),
        BinaryOp::And => Some("&&"),
        BinaryOp::Or => Some("||"),
        BinaryOp::In => None,
    }
}

fn leaf_expr(
    context: &BTreeSet<String>,
    value: &OolValue,
    where_: &str,
) -> Result<Expr, CodegenError> {
    if let OolValue::ObjectRef { name } = value {
        let root = member_root(name);
        if !context.contains(root) {
            return Err(CodegenError::UnresolvedReference {
                name: name.clone(),
                context: where_.to_string(),
            });
        }
    }
    Ok(ast::value_expr(value))
}

/// Translate a test expression into a guard over context variables.
pub fn translate_test(
    context: &BTreeSet<String>,
    test: &FilterExpr,
    where_: &str,
) -> Result<Expr, CodegenError> {
    match test {
        FilterExpr::Binary {
            operator,
            left,
            right,
        } => {
            let left = translate_test(context, left, where_)?;
            let right = translate_test(context, right, where_)?;
            match binary_guard(*operator) {
                Some(op) => Ok(ast::binary(op, left, right)),
                // membership has no operator form, goes through the runtime
                None => Ok(ast::call(
                    "contains",
                    vec![ast::ref_(right), ast::ref_(left)],
                )),
            }
        }
        FilterExpr::Unary { operator, argument } => {
            let argument = translate_test(context, argument, where_)?;
            Ok(match operator {
                UnaryOp::Exists => {
                    ast::not(ast::call("is_empty", vec![ast::ref_(argument)]))
                }
                UnaryOp::NotExists => ast::call("is_empty", vec![ast::ref_(argument)]),
                UnaryOp::IsNull => ast::call("is_nil", vec![ast::ref_(argument)]),
                UnaryOp::IsNotNull => {
                    ast::not(ast::call("is_nil", vec![ast::ref_(argument)]))
                }
                UnaryOp::Not => ast::not(argument),
            })
        }
        FilterExpr::Value(value) => leaf_expr(context, value, where_),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oolong_ir::Literal;

    fn ctx(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn not_exists_lowers_to_is_empty() {
        let test = FilterExpr::Unary {
            operator: UnaryOp::NotExists,
            argument: Box::new(FilterExpr::Value(OolValue::object_ref("user"))),
        };
        let expr = translate_test(&ctx(&["user"]), &test, "validate_user").unwrap();
        match expr {
            Expr::Call { func, .. } => assert_eq!(func, "is_empty"),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn equality_lowers_to_double_equals() {
        let test = FilterExpr::Binary {
            operator: BinaryOp::Eq,
            left: Box::new(FilterExpr::Value(OolValue::object_ref("user.status"))),
            right: Box::new(FilterExpr::Value(OolValue::Literal(Literal::String(
                "active".to_string(),
            )))),
        };
        let expr = translate_test(&ctx(&["user"]), &test, "check").unwrap();
        match expr {
            Expr::Binary { op, .. } => assert_eq!(op, "=="),
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn out_of_scope_reference_is_an_error() {
        let test = FilterExpr::Unary {
            operator: UnaryOp::Exists,
            argument: Box::new(FilterExpr::Value(OolValue::object_ref("missing.field"))),
        };
        let err = translate_test(&ctx(&["user"]), &test, "check").unwrap_err();
        assert!(matches!(err, CodegenError::UnresolvedReference { .. }));
    }
}
