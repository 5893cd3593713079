//! Abstract syntax for generated model modules.
//!
//! A deliberately small subset of the target language, just enough for
//! the model files the generator emits. The exporter renders it to
//! source text; builder functions below keep generation code readable.

use oolong_ir::{member_path, Literal, OolValue};

/// Expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// `null` inside a json literal, `Value::Null` elsewhere.
    Null,
    Array(Vec<Expr>),
    /// Map literal; only valid inside a json literal.
    Map(Vec<(String, Expr)>),
    /// `json!(...)` wrapper around a map/array/scalar.
    Json(Box<Expr>),
    Call {
        func: String,
        args: Vec<Expr>,
    },
    MethodCall {
        recv: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Binary {
        op: &'static str,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    /// `expr?`
    Try(Box<Expr>),
    /// `&expr`
    Ref(Box<Expr>),
    /// `&mut expr`
    MutRef(Box<Expr>),
}

/// Statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    Let {
        /// Binding pattern; usually a name, may destructure.
        pattern: String,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        els: Option<Vec<Stmt>>,
    },
    Return(Expr),
    /// Final expression of a block, no semicolon.
    Tail(Expr),
    Expr(Expr),
    Comment(String),
}

/// Function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

/// Top-level item of a generated module.
#[derive(Debug, Clone)]
pub enum Item {
    Use(String),
    Const {
        name: String,
        ty: String,
        value: Expr,
    },
    Fn {
        doc: Vec<String>,
        name: String,
        params: Vec<Param>,
        ret: String,
        body: Vec<Stmt>,
    },
}

/// A generated module: banner comment lines plus items.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub header: Vec<String>,
    pub items: Vec<Item>,
}

pub fn ident(name: impl Into<String>) -> Expr {
    Expr::Ident(name.into())
}

pub fn str_lit(s: impl Into<String>) -> Expr {
    Expr::Str(s.into())
}

pub fn call(func: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::Call {
        func: func.into(),
        args,
    }
}

pub fn method(recv: Expr, name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::MethodCall {
        recv: Box::new(recv),
        method: name.into(),
        args,
    }
}

pub fn binary(op: &'static str, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn not(e: Expr) -> Expr {
    Expr::Not(Box::new(e))
}

pub fn try_(e: Expr) -> Expr {
    Expr::Try(Box::new(e))
}

pub fn ref_(e: Expr) -> Expr {
    Expr::Ref(Box::new(e))
}

pub fn mut_ref(e: Expr) -> Expr {
    Expr::MutRef(Box::new(e))
}

pub fn json(e: Expr) -> Expr {
    Expr::Json(Box::new(e))
}

/// `get(&source, "key")`: runtime document accessor.
pub fn get(source: Expr, key: &str) -> Expr {
    call("get", vec![ref_(source), str_lit(key)])
}

/// `has_value(&source, "key")`
pub fn has_value(source: Expr, key: &str) -> Expr {
    call("has_value", vec![ref_(source), str_lit(key)])
}

fn literal_expr(lit: &Literal) -> Expr {
    match lit {
        Literal::Null => Expr::Null,
        Literal::Bool(b) => Expr::Bool(*b),
        Literal::Int(i) => Expr::Int(*i),
        Literal::Float(f) => Expr::Float(*f),
        Literal::String(s) => Expr::Str(s.clone()),
    }
}

/// Lower a value node into an expression, resolving object references
/// against in-scope context variables: `user.password_salt` becomes
/// `get(&user, "password_salt")`.
pub fn value_expr(value: &OolValue) -> Expr {
    match value {
        OolValue::Literal(lit) => literal_expr(lit),
        OolValue::Variable { name } => ident(name.clone()),
        OolValue::ObjectRef { name } => {
            let segments = member_path(name);
            let mut expr = ident(segments[0]);
            for seg in &segments[1..] {
                expr = get(expr, seg);
            }
            expr
        }
        OolValue::Array { value } => json(Expr::Array(value.iter().map(value_expr).collect())),
        OolValue::Object { value } => json(Expr::Map(
            value
                .iter()
                .map(|(k, v)| (k.clone(), value_expr(v)))
                .collect(),
        )),
    }
}
