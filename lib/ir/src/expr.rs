//! Tagged expression trees.
//!
//! Two trees share the same leaf nodes:
//! - `OolValue`: values appearing in modifier arguments, defaults,
//!   assignments and return specifications;
//! - `FilterExpr`: boolean filter/test expressions over those values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Scalar literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A value node. Non-scalar nodes carry a `type` tag in JSON; bare
/// scalars deserialize as literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OolValue {
    Variable {
        name: String,
    },
    #[serde(rename = "ObjectReference")]
    ObjectRef {
        name: String,
    },
    Array {
        value: Vec<OolValue>,
    },
    Object {
        value: BTreeMap<String, OolValue>,
    },
    #[serde(untagged)]
    Literal(Literal),
}

impl OolValue {
    pub fn str(s: impl Into<String>) -> Self {
        OolValue::Literal(Literal::String(s.into()))
    }

    pub fn int(v: i64) -> Self {
        OolValue::Literal(Literal::Int(v))
    }

    pub fn object_ref(name: impl Into<String>) -> Self {
        OolValue::ObjectRef { name: name.into() }
    }

    /// The dotted reference name if this is an object reference.
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            OolValue::ObjectRef { name } => Some(name),
            _ => None,
        }
    }
}

/// Binary filter/test operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
}

/// Unary filter/test operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "not-exists")]
    NotExists,
    #[serde(rename = "is-null")]
    IsNull,
    #[serde(rename = "is-not-null")]
    IsNotNull,
    #[serde(rename = "not")]
    Not,
}

/// A boolean filter/test expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FilterExpr {
    #[serde(rename = "BinaryExpression")]
    Binary {
        operator: BinaryOp,
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
    #[serde(rename = "UnaryExpression")]
    Unary {
        operator: UnaryOp,
        argument: Box<FilterExpr>,
    },
    #[serde(untagged)]
    Value(OolValue),
}

impl FilterExpr {
    pub fn binary(operator: BinaryOp, left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(operator: UnaryOp, argument: FilterExpr) -> Self {
        FilterExpr::Unary {
            operator,
            argument: Box::new(argument),
        }
    }
}

/// Split a dotted member path into segments.
pub fn member_path(name: &str) -> Vec<&str> {
    name.split('.').collect()
}

/// First segment of a dotted member path.
pub fn member_root(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// True if the name is a dotted member access.
pub fn is_member_access(name: &str) -> bool {
    name.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_path_helpers() {
        assert_eq!(member_path("existing.password"), vec!["existing", "password"]);
        assert_eq!(member_root("user.profile.avatar"), "user");
        assert_eq!(member_root("user"), "user");
        assert!(is_member_access("a.b"));
        assert!(!is_member_access("a"));
    }

    #[test]
    fn object_reference_node() {
        let v: OolValue =
            serde_json::from_str(r#"{"type": "ObjectReference", "name": "existing.password"}"#)
                .unwrap();
        assert_eq!(v.ref_name(), Some("existing.password"));

        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "ObjectReference");
        assert_eq!(json["name"], "existing.password");
    }

    #[test]
    fn bare_scalar_is_literal() {
        let v: OolValue = serde_json::from_str("42").unwrap();
        assert_eq!(v, OolValue::int(42));

        let v: OolValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(v, OolValue::str("hello"));

        let v: OolValue = serde_json::from_str("null").unwrap();
        assert_eq!(v, OolValue::Literal(Literal::Null));
    }

    #[test]
    fn filter_tree_roundtrip() {
        let src = r#"{
            "type": "BinaryExpression",
            "operator": "or",
            "left": {
                "type": "BinaryExpression",
                "operator": "=",
                "left": {"type": "Variable", "name": "email"},
                "right": {"type": "ObjectReference", "name": "identity"}
            },
            "right": {
                "type": "UnaryExpression",
                "operator": "is-not-null",
                "argument": {"type": "Variable", "name": "mobile"}
            }
        }"#;

        let filter: FilterExpr = serde_json::from_str(src).unwrap();
        match &filter {
            FilterExpr::Binary { operator, .. } => assert_eq!(*operator, BinaryOp::Or),
            other => panic!("expected binary expression, got {:?}", other),
        }

        let json = serde_json::to_string(&filter).unwrap();
        let back: FilterExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(filter, back);
    }
}
