//! Expression trees behind unknown refs.
//!
//! A ref whose value cannot be computed at build time carries an [`Expr`]
//! describing how the runtime computes it instead. Trees are composed from
//! operator nodes and leaves, and are only turned into text at the
//! serialization boundary ([`Expr::to_runtime`]), which yields the
//! `${ <expression> }` form the downstream runtime evaluates.
//!
//! Operators on known operands never reach this module's tree builders: the
//! fold functions ([`BinaryOp::fold`], [`UnaryOp::fold`], [`fold_concat`])
//! compute the value directly, with the same semantics the runtime would use.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::error::RefError;

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

/// Where a runtime variable gets its value when the workflow starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuntimeSource {
    /// An environment variable of the workflow runtime.
    Env(String),
    /// A secret held by the runtime.
    Secret(String),
    /// A dot path into the workflow input (empty for the whole input).
    Input(String),
}

impl RuntimeSource {
    /// The runtime expression that produces the variable's initial value.
    pub fn initializer(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Env(name) => {
                out.push_str("$env");
                push_segment(&mut out, name);
            }
            Self::Secret(name) => {
                out.push_str("$secrets");
                push_segment(&mut out, name);
            }
            Self::Input(path) => {
                out.push_str("$input");
                for seg in path.split('.').filter(|s| !s.is_empty()) {
                    push_segment(&mut out, seg);
                }
            }
        }
        format!("${{ {out} }}")
    }

    /// Name of the environment requirement this source implies, if any.
    pub fn env_requirement(&self) -> Option<(&str, bool)> {
        match self {
            Self::Env(name) => Some((name, false)),
            Self::Secret(name) => Some((name, true)),
            Self::Input(_) => None,
        }
    }
}

/// A context variable whose value is only available once the workflow runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarRef {
    /// Variable name under `$context`.
    pub name: String,
    /// How the variable is initialized at workflow start.
    pub source: RuntimeSource,
}

/// A runtime reference found in an expression tree, in left-to-right order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf<'a> {
    /// A start-resolvable context variable.
    Var(&'a VarRef),
    /// The output of a named task.
    TaskOutput(&'a str),
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Two-operand operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
}

impl BinaryOp {
    /// The operator as written in runtime expressions.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Short label used in derived ref names and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Compute the operator over two known values.
    ///
    /// Integers are `i64`; overflow is an error rather than a wrap, and
    /// division truncates toward zero. `+` on two strings concatenates.
    pub fn fold(self, lhs: &Value, rhs: &Value) -> Result<Value, RefError> {
        match self {
            Self::Add if lhs.is_string() && rhs.is_string() => {
                Ok(Value::String(format!("{}{}", text(lhs), text(rhs))))
            }
            Self::Add | Self::Sub | Self::Mul | Self::Div => {
                let (a, b) = match (lhs.as_i64(), rhs.as_i64()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err(self.mismatch(lhs, rhs)),
                };
                let result = match self {
                    Self::Add => a.checked_add(b),
                    Self::Sub => a.checked_sub(b),
                    Self::Mul => a.checked_mul(b),
                    _ => {
                        if b == 0 {
                            return Err(RefError::DivisionByZero);
                        }
                        a.checked_div(b)
                    }
                };
                result.map(Value::from).ok_or_else(|| RefError::IntegerOverflow {
                    op: self.label().to_string(),
                })
            }
            Self::Eq => Ok(Value::Bool(lhs == rhs)),
            Self::Ne => Ok(Value::Bool(lhs != rhs)),
            Self::Gt | Self::Ge | Self::Lt | Self::Le => {
                let ord = compare(lhs, rhs).ok_or_else(|| self.mismatch(lhs, rhs))?;
                let result = match self {
                    Self::Gt => ord == Ordering::Greater,
                    Self::Ge => ord != Ordering::Less,
                    Self::Lt => ord == Ordering::Less,
                    _ => ord != Ordering::Greater,
                };
                Ok(Value::Bool(result))
            }
            Self::And | Self::Or => match (lhs.as_bool(), rhs.as_bool()) {
                (Some(a), Some(b)) => Ok(Value::Bool(if self == Self::And {
                    a && b
                } else {
                    a || b
                })),
                _ => Err(self.mismatch(lhs, rhs)),
            },
        }
    }

    fn mismatch(self, lhs: &Value, rhs: &Value) -> RefError {
        RefError::type_mismatch(
            self.label(),
            format!("{} and {}", type_name(lhs), type_name(rhs)),
        )
    }
}

/// Single-operand operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Upper,
    Lower,
}

impl UnaryOp {
    /// The jq filter the operator renders as.
    pub fn filter(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Upper => "ascii_upcase",
            Self::Lower => "ascii_downcase",
        }
    }

    /// Short label used in derived ref names and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }

    /// Compute the operator over a known value. Case mapping is ASCII-only,
    /// matching `ascii_upcase`/`ascii_downcase`.
    pub fn fold(self, operand: &Value) -> Result<Value, RefError> {
        match (self, operand) {
            (Self::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (Self::Upper, Value::String(s)) => Ok(Value::String(s.to_ascii_uppercase())),
            (Self::Lower, Value::String(s)) => Ok(Value::String(s.to_ascii_lowercase())),
            _ => Err(RefError::type_mismatch(self.label(), type_name(operand))),
        }
    }
}

/// Concatenate known values as text.
pub fn fold_concat(parts: &[&Value]) -> Value {
    Value::String(parts.iter().map(|v| text(v)).collect())
}

// ---------------------------------------------------------------------------
// Expression tree
// ---------------------------------------------------------------------------

/// A deferred runtime computation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A build-time constant embedded in a larger expression.
    Literal(Value),
    /// A start-resolvable context variable (`$context.<name>`).
    Var(VarRef),
    /// A field of a task's exported output (`$context.<task>.<path>`).
    TaskField { task: String, path: Vec<String> },
    /// A runtime-local binding such as a loop item (`$<name>.<path>`).
    Local { name: String, path: Vec<String> },
    /// Key access on a composite expression.
    Field { object: Box<Expr>, key: String },
    /// String concatenation of two or more parts.
    Concat(Vec<Expr>),
    /// A binary operator application.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A unary operator application.
    Unary { op: UnaryOp, operand: Box<Expr> },
}

impl Expr {
    /// Access `key` on this expression, extending paths in place where possible.
    pub fn field(self, key: impl Into<String>) -> Expr {
        let key = key.into();
        match self {
            Expr::TaskField { task, mut path } => {
                path.push(key);
                Expr::TaskField { task, path }
            }
            Expr::Local { name, mut path } => {
                path.push(key);
                Expr::Local { name, path }
            }
            other => Expr::Field {
                object: Box::new(other),
                key,
            },
        }
    }

    /// Render as a runtime expression: `${ <expr> }`.
    pub fn to_runtime(&self) -> String {
        format!("${{ {self} }}")
    }

    /// Runtime references in left-to-right order. Literals and locals are skipped.
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<Leaf<'a>>) {
        match self {
            Expr::Literal(_) | Expr::Local { .. } => {}
            Expr::Var(var) => out.push(Leaf::Var(var)),
            Expr::TaskField { task, .. } => out.push(Leaf::TaskOutput(task)),
            Expr::Field { object, .. } => object.collect_leaves(out),
            Expr::Concat(parts) => parts.iter().for_each(|p| p.collect_leaves(out)),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_leaves(out);
                rhs.collect_leaves(out);
            }
            Expr::Unary { operand, .. } => operand.collect_leaves(out),
        }
    }

    /// Whether the expression renders without needing grouping parentheses.
    fn is_atom(&self) -> bool {
        match self {
            Expr::Concat(_) => false,
            Expr::Binary { op, .. } => *op == BinaryOp::Div,
            _ => true,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_atom() {
            write!(f, "{self}")
        } else {
            write!(f, "({self})")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Var(var) => {
                let mut out = String::from("$context");
                push_segment(&mut out, &var.name);
                f.write_str(&out)
            }
            Expr::TaskField { task, path } => {
                let mut out = String::from("$context");
                push_segment(&mut out, task);
                path.iter().for_each(|seg| push_segment(&mut out, seg));
                f.write_str(&out)
            }
            Expr::Local { name, path } => {
                let mut out = format!("${name}");
                path.iter().for_each(|seg| push_segment(&mut out, seg));
                f.write_str(&out)
            }
            Expr::Field { object, key } => {
                object.fmt_operand(f)?;
                let mut out = String::new();
                push_segment(&mut out, key);
                f.write_str(&out)
            }
            Expr::Concat(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    part.fmt_operand(f)?;
                }
                Ok(())
            }
            // jq's `/` is float division; truncate so the result matches the fold.
            Expr::Binary {
                op: BinaryOp::Div,
                lhs,
                rhs,
            } => {
                f.write_str("(")?;
                lhs.fmt_operand(f)?;
                f.write_str(" / ")?;
                rhs.fmt_operand(f)?;
                f.write_str(" | trunc)")
            }
            Expr::Binary { op, lhs, rhs } => {
                lhs.fmt_operand(f)?;
                write!(f, " {} ", op.symbol())?;
                rhs.fmt_operand(f)
            }
            Expr::Unary { op, operand } => write!(f, "({operand} | {})", op.filter()),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Append `.seg`, quoting the segment when it is not a plain identifier.
pub(crate) fn push_segment(out: &mut String, seg: &str) {
    out.push('.');
    if is_identifier(seg) {
        out.push_str(seg);
    } else {
        out.push_str(&Value::String(seg.to_string()).to_string());
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(_)) => Some(lhs.as_i64()?.cmp(&rhs.as_i64()?)),
        (Value::String(a), Value::String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        _ => None,
    }
}

/// JSON type name of a value, for error messages.
pub(crate) fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn var(name: &str) -> Expr {
        Expr::Var(VarRef {
            name: name.into(),
            source: RuntimeSource::Env(name.to_uppercase()),
        })
    }

    fn task_field(task: &str, field: &str) -> Expr {
        Expr::TaskField {
            task: task.into(),
            path: vec![field.into()],
        }
    }

    // -- rendering ---------------------------------------------------------

    #[test]
    fn renders_variable_and_task_field() {
        assert_eq!(var("host").to_runtime(), "${ $context.host }");
        assert_eq!(
            task_field("fetchTask", "title").to_runtime(),
            "${ $context.fetchTask.title }"
        );
    }

    #[test]
    fn quotes_non_identifier_segments() {
        let e = task_field("fetch", "content-type");
        assert_eq!(e.to_string(), r#"$context.fetch."content-type""#);
    }

    #[test]
    fn renders_binary_with_grouping() {
        let inner = Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(var("count")),
            rhs: Box::new(Expr::Literal(json!(1))),
        };
        let outer = Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(inner),
            rhs: Box::new(Expr::Literal(json!(2))),
        };
        assert_eq!(outer.to_runtime(), "${ ($context.count + 1) * 2 }");
    }

    #[test]
    fn renders_concat_and_unary() {
        let e = Expr::Concat(vec![Expr::Literal(json!("https://")), var("host")]);
        assert_eq!(e.to_string(), r#""https://" + $context.host"#);

        let e = Expr::Unary {
            op: UnaryOp::Upper,
            operand: Box::new(var("name")),
        };
        assert_eq!(e.to_string(), "($context.name | ascii_upcase)");
    }

    #[test]
    fn field_extends_task_paths() {
        let e = task_field("fetch", "user").field("name");
        assert_eq!(e.to_string(), "$context.fetch.user.name");

        let e = Expr::Concat(vec![var("a"), var("b")]).field("x");
        assert_eq!(e.to_string(), "($context.a + $context.b).x");
    }

    #[test]
    fn initializers() {
        assert_eq!(
            RuntimeSource::Env("API_BASE".into()).initializer(),
            "${ $env.API_BASE }"
        );
        assert_eq!(
            RuntimeSource::Secret("TOKEN".into()).initializer(),
            "${ $secrets.TOKEN }"
        );
        assert_eq!(
            RuntimeSource::Input("request.user".into()).initializer(),
            "${ $input.request.user }"
        );
        assert_eq!(RuntimeSource::Input(String::new()).initializer(), "${ $input }");
    }

    // -- leaves ------------------------------------------------------------

    #[test]
    fn leaves_in_operand_order() {
        let e = Expr::Concat(vec![
            task_field("a", "x"),
            Expr::Literal(json!("-")),
            var("v"),
            Expr::Local {
                name: "item".into(),
                path: vec![],
            },
        ]);
        let leaves = e.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0], Leaf::TaskOutput("a"));
        assert!(matches!(leaves[1], Leaf::Var(v) if v.name == "v"));
    }

    // -- folding -----------------------------------------------------------

    #[test]
    fn folds_integer_arithmetic() {
        assert_eq!(BinaryOp::Add.fold(&json!(2), &json!(3)).unwrap(), json!(5));
        assert_eq!(BinaryOp::Sub.fold(&json!(2), &json!(3)).unwrap(), json!(-1));
        assert_eq!(BinaryOp::Mul.fold(&json!(4), &json!(3)).unwrap(), json!(12));
        assert_eq!(BinaryOp::Div.fold(&json!(-7), &json!(2)).unwrap(), json!(-3));
    }

    #[test]
    fn division_renders_with_truncation() {
        let e = Expr::Binary {
            op: BinaryOp::Div,
            lhs: Box::new(var("n")),
            rhs: Box::new(Expr::Literal(json!(2))),
        };
        assert_eq!(e.to_runtime(), "${ ($context.n / 2 | trunc) }");

        let scaled = Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(e),
            rhs: Box::new(Expr::Literal(json!(3))),
        };
        assert_eq!(scaled.to_runtime(), "${ ($context.n / 2 | trunc) * 3 }");
    }

    #[test]
    fn overflow_and_division_by_zero_fail() {
        let err = BinaryOp::Add.fold(&json!(i64::MAX), &json!(1)).unwrap_err();
        assert_eq!(err, RefError::IntegerOverflow { op: "add".into() });
        let err = BinaryOp::Div.fold(&json!(1), &json!(0)).unwrap_err();
        assert_eq!(err, RefError::DivisionByZero);
    }

    #[test]
    fn folds_comparisons() {
        assert_eq!(BinaryOp::Gt.fold(&json!(3), &json!(2)).unwrap(), json!(true));
        assert_eq!(BinaryOp::Le.fold(&json!(3), &json!(2)).unwrap(), json!(false));
        assert_eq!(BinaryOp::Lt.fold(&json!("a"), &json!("b")).unwrap(), json!(true));
        assert_eq!(BinaryOp::Eq.fold(&json!("a"), &json!("a")).unwrap(), json!(true));
        assert!(BinaryOp::Gt.fold(&json!("a"), &json!(1)).is_err());
    }

    #[test]
    fn folds_logic_and_case() {
        assert_eq!(BinaryOp::And.fold(&json!(true), &json!(false)).unwrap(), json!(false));
        assert_eq!(BinaryOp::Or.fold(&json!(true), &json!(false)).unwrap(), json!(true));
        assert_eq!(UnaryOp::Not.fold(&json!(true)).unwrap(), json!(false));
        assert_eq!(UnaryOp::Upper.fold(&json!("ab-ç")).unwrap(), json!("AB-ç"));
        assert_eq!(fold_concat(&[&json!("a"), &json!("b")]), json!("ab"));
    }
}
