//! The Ref family: typed handles to values that are either known at build
//! time or only computed by the runtime.
//!
//! Every operation on a ref goes through one of the `derive_*` functions
//! below. When all operands are known the result is folded immediately;
//! otherwise it carries an [`Expr`] and stays unknown. Unknown-ness is
//! contagious: nothing derived from an unknown ref is ever known.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::RefError;
use crate::expr::{fold_concat, BinaryOp, Expr, RuntimeSource, UnaryOp, VarRef};

/// Name given to refs created implicitly from plain Rust values.
const LITERAL_NAME: &str = "literal";

// ---------------------------------------------------------------------------
// RefCore
// ---------------------------------------------------------------------------

/// Known value or deferred expression.
#[derive(Clone, PartialEq)]
pub enum RefState {
    Known(Value),
    Unknown(Expr),
}

/// Untyped ref data shared by all typed refs.
#[derive(Clone, PartialEq)]
pub struct RefCore {
    name: String,
    secret: bool,
    state: RefState,
}

impl RefCore {
    pub fn known(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            secret: false,
            state: RefState::Known(value),
        }
    }

    pub fn unknown(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            secret: false,
            state: RefState::Unknown(expr),
        }
    }

    /// A start-resolvable variable. Secret sources yield secret refs.
    pub fn runtime(name: impl Into<String>, source: RuntimeSource) -> Self {
        let name = name.into();
        let secret = matches!(source, RuntimeSource::Secret(_));
        let expr = Expr::Var(VarRef {
            name: name.clone(),
            source,
        });
        Self::unknown(name, expr).with_secret(secret)
    }

    /// The output of task `task`, narrowed by `path`.
    pub fn task_output(task: &str, path: Vec<String>) -> Self {
        let name = if path.is_empty() {
            task.to_string()
        } else {
            format!("{task}.{}", path.join("."))
        };
        Self::unknown(
            name,
            Expr::TaskField {
                task: task.to_string(),
                path,
            },
        )
    }

    /// A runtime-local binding such as a loop item or caught error.
    pub fn local(name: &str) -> Self {
        Self::unknown(
            name,
            Expr::Local {
                name: name.to_string(),
                path: Vec::new(),
            },
        )
    }

    pub fn with_secret(mut self, secret: bool) -> Self {
        self.secret = secret;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    pub fn is_known(&self) -> bool {
        matches!(self.state, RefState::Known(_))
    }

    pub fn state(&self) -> &RefState {
        &self.state
    }

    /// The folded value, if known.
    pub fn value(&self) -> Option<&Value> {
        match &self.state {
            RefState::Known(v) => Some(v),
            RefState::Unknown(_) => None,
        }
    }

    /// The deferred expression, if unknown.
    pub fn expr(&self) -> Option<&Expr> {
        match &self.state {
            RefState::Known(_) => None,
            RefState::Unknown(e) => Some(e),
        }
    }

    /// The runtime expression text (`${ ... }`), if unknown.
    pub fn expression(&self) -> Option<String> {
        self.expr().map(Expr::to_runtime)
    }

    /// This ref as an operand inside a larger expression.
    pub fn to_expr(&self) -> Expr {
        match &self.state {
            RefState::Known(v) => Expr::Literal(v.clone()),
            RefState::Unknown(e) => e.clone(),
        }
    }

    /// What this ref looks like in the manifest: the folded value when
    /// known, the expression text otherwise.
    pub fn to_wire(&self) -> Value {
        match &self.state {
            RefState::Known(v) => v.clone(),
            RefState::Unknown(e) => Value::String(e.to_runtime()),
        }
    }

    /// Access `key`. Known objects fail fast on a missing key.
    pub fn field(&self, key: &str) -> Result<RefCore, RefError> {
        let name = format!("{}.{key}", self.name);
        match &self.state {
            RefState::Known(Value::Object(map)) => match map.get(key) {
                Some(v) => Ok(RefCore::known(name, v.clone()).with_secret(self.secret)),
                None => Err(RefError::FieldNotFound {
                    object: self.name.clone(),
                    key: key.to_string(),
                }),
            },
            RefState::Known(_) => Err(RefError::NotAnObject {
                name: self.name.clone(),
            }),
            RefState::Unknown(e) => {
                Ok(RefCore::unknown(name, e.clone().field(key)).with_secret(self.secret))
            }
        }
    }
}

impl fmt::Debug for RefCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Ref");
        s.field("name", &self.name);
        s.field("secret", &self.secret);
        match (&self.state, self.secret) {
            (RefState::Known(_), true) => s.field("value", &"<redacted>"),
            (RefState::Known(v), false) => s.field("value", v),
            (RefState::Unknown(e), _) => s.field("expr", &e.to_string()),
        };
        s.finish()
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Apply a binary operator, folding when both operands are known.
pub fn derive_binary(op: BinaryOp, lhs: &RefCore, rhs: &RefCore) -> Result<RefCore, RefError> {
    let name = format!("{}_{}", lhs.name, op.label());
    let secret = lhs.secret || rhs.secret;
    let derived = match (&lhs.state, &rhs.state) {
        (RefState::Known(a), RefState::Known(b)) => RefCore::known(name, op.fold(a, b)?),
        _ => RefCore::unknown(
            name,
            Expr::Binary {
                op,
                lhs: Box::new(lhs.to_expr()),
                rhs: Box::new(rhs.to_expr()),
            },
        ),
    };
    Ok(derived.with_secret(secret))
}

/// Apply a unary operator, folding when the operand is known.
pub fn derive_unary(op: UnaryOp, operand: &RefCore) -> Result<RefCore, RefError> {
    let name = format!("{}_{}", operand.name, op.label());
    let derived = match &operand.state {
        RefState::Known(v) => RefCore::known(name, op.fold(v)?),
        RefState::Unknown(e) => RefCore::unknown(
            name,
            Expr::Unary {
                op,
                operand: Box::new(e.clone()),
            },
        ),
    };
    Ok(derived.with_secret(operand.secret))
}

/// Concatenate parts as text, folding when every part is known.
pub fn derive_concat(parts: &[&RefCore]) -> RefCore {
    let name = match parts.first() {
        Some(first) => format!("{}_concat", first.name),
        None => "concat".to_string(),
    };
    let secret = parts.iter().any(|p| p.secret);
    let known: Option<Vec<&Value>> = parts.iter().map(|p| p.value()).collect();
    let derived = match known {
        Some(values) => RefCore::known(name, fold_concat(&values)),
        None => {
            let mut flat = Vec::with_capacity(parts.len());
            for part in parts {
                match part.to_expr() {
                    Expr::Concat(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            RefCore::unknown(name, Expr::Concat(flat))
        }
    };
    derived.with_secret(secret)
}

/// Derivation for operators that cannot fail on well-typed operands. A fold
/// error can only come from a mistyped known value (see `from_core`); the
/// runtime gets to decide in that case.
fn derive_total(op: BinaryOp, lhs: &RefCore, rhs: &RefCore) -> RefCore {
    derive_binary(op, lhs, rhs).unwrap_or_else(|err| {
        debug_assert!(false, "{op:?} failed on known operands: {err}");
        RefCore::unknown(
            format!("{}_{}", lhs.name, op.label()),
            Expr::Binary {
                op,
                lhs: Box::new(lhs.to_expr()),
                rhs: Box::new(rhs.to_expr()),
            },
        )
        .with_secret(lhs.secret || rhs.secret)
    })
}

fn derive_total_unary(op: UnaryOp, operand: &RefCore) -> RefCore {
    derive_unary(op, operand).unwrap_or_else(|err| {
        debug_assert!(false, "{op:?} failed on a known operand: {err}");
        RefCore::unknown(
            format!("{}_{}", operand.name, op.label()),
            Expr::Unary {
                op,
                operand: Box::new(operand.to_expr()),
            },
        )
        .with_secret(operand.secret)
    })
}

// ---------------------------------------------------------------------------
// Typed refs
// ---------------------------------------------------------------------------

macro_rules! typed_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq)]
        pub struct $name(RefCore);

        impl $name {
            /// Wraps an untyped ref. The caller vouches for the value type:
            /// a known value of the wrong type makes total operators defer
            /// to the runtime instead of folding (and panics in debug builds).
            pub fn from_core(core: RefCore) -> Self {
                Self(core)
            }

            pub fn core(&self) -> &RefCore {
                &self.0
            }

            pub fn name(&self) -> &str {
                self.0.name()
            }

            pub fn is_secret(&self) -> bool {
                self.0.is_secret()
            }

            pub fn is_known(&self) -> bool {
                self.0.is_known()
            }

            /// Runtime expression text, `None` when the value is known.
            pub fn expression(&self) -> Option<String> {
                self.0.expression()
            }

            /// Manifest form: folded value or expression text.
            pub fn to_wire(&self) -> Value {
                self.0.to_wire()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(&self.0, f)
            }
        }

        impl From<$name> for RefCore {
            fn from(r: $name) -> Self {
                r.0
            }
        }

        impl From<&$name> for $name {
            fn from(r: &$name) -> Self {
                r.clone()
            }
        }
    };
}

typed_ref!(
    /// A string-valued ref.
    StringRef
);
typed_ref!(
    /// An integer-valued ref (`i64`).
    IntRef
);
typed_ref!(
    /// A boolean-valued ref.
    BoolRef
);
typed_ref!(
    /// A JSON-object-valued ref.
    ObjectRef
);
typed_ref!(
    /// A ref of not-yet-narrowed type, produced by object field access.
    ValueRef
);

impl StringRef {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self(RefCore::known(name, Value::String(value.into())))
    }

    /// A known value that must not show up in logs. The manifest still
    /// carries it in plain text; use a [`RuntimeSource::Secret`] variable
    /// to keep it out.
    pub fn secret(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self(RefCore::known(name, Value::String(value.into())).with_secret(true))
    }

    pub fn runtime(name: impl Into<String>, source: RuntimeSource) -> Self {
        Self(RefCore::runtime(name, source))
    }

    pub fn value(&self) -> Option<&str> {
        self.0.value().and_then(Value::as_str)
    }

    /// `self + other`.
    pub fn concat(&self, other: impl Into<StringRef>) -> StringRef {
        let other = other.into();
        StringRef(derive_concat(&[&self.0, &other.0]))
    }

    pub fn append(&self, suffix: impl Into<StringRef>) -> StringRef {
        self.concat(suffix)
    }

    /// `other + self`. The result keeps this ref's name stem.
    pub fn prepend(&self, prefix: impl Into<StringRef>) -> StringRef {
        let prefix = prefix.into();
        let mut core = derive_concat(&[&prefix.0, &self.0]);
        core.name = format!("{}_prepend", self.0.name);
        StringRef(core)
    }

    pub fn upper(&self) -> StringRef {
        StringRef(derive_total_unary(UnaryOp::Upper, &self.0))
    }

    pub fn lower(&self) -> StringRef {
        StringRef(derive_total_unary(UnaryOp::Lower, &self.0))
    }

    pub fn equals(&self, other: impl Into<StringRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Eq, &self.0, &other.into().0))
    }

    pub fn not_equals(&self, other: impl Into<StringRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Ne, &self.0, &other.into().0))
    }

    pub fn gt(&self, other: impl Into<StringRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Gt, &self.0, &other.into().0))
    }

    pub fn ge(&self, other: impl Into<StringRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Ge, &self.0, &other.into().0))
    }

    pub fn lt(&self, other: impl Into<StringRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Lt, &self.0, &other.into().0))
    }

    pub fn le(&self, other: impl Into<StringRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Le, &self.0, &other.into().0))
    }
}

impl IntRef {
    pub fn literal(name: impl Into<String>, value: i64) -> Self {
        Self(RefCore::known(name, Value::from(value)))
    }

    pub fn runtime(name: impl Into<String>, source: RuntimeSource) -> Self {
        Self(RefCore::runtime(name, source))
    }

    pub fn value(&self) -> Option<i64> {
        self.0.value().and_then(Value::as_i64)
    }

    /// # Errors
    ///
    /// [`RefError::IntegerOverflow`] if both sides are known and the sum
    /// does not fit in `i64`.
    pub fn add(&self, other: impl Into<IntRef>) -> Result<IntRef, RefError> {
        derive_binary(BinaryOp::Add, &self.0, &other.into().0).map(IntRef)
    }

    pub fn subtract(&self, other: impl Into<IntRef>) -> Result<IntRef, RefError> {
        derive_binary(BinaryOp::Sub, &self.0, &other.into().0).map(IntRef)
    }

    pub fn multiply(&self, other: impl Into<IntRef>) -> Result<IntRef, RefError> {
        derive_binary(BinaryOp::Mul, &self.0, &other.into().0).map(IntRef)
    }

    /// Truncating division.
    ///
    /// # Errors
    ///
    /// [`RefError::DivisionByZero`] for a known zero divisor with a known
    /// dividend, [`RefError::IntegerOverflow`] for `i64::MIN / -1`.
    pub fn divide(&self, other: impl Into<IntRef>) -> Result<IntRef, RefError> {
        derive_binary(BinaryOp::Div, &self.0, &other.into().0).map(IntRef)
    }

    pub fn equals(&self, other: impl Into<IntRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Eq, &self.0, &other.into().0))
    }

    pub fn not_equals(&self, other: impl Into<IntRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Ne, &self.0, &other.into().0))
    }

    pub fn gt(&self, other: impl Into<IntRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Gt, &self.0, &other.into().0))
    }

    pub fn ge(&self, other: impl Into<IntRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Ge, &self.0, &other.into().0))
    }

    pub fn lt(&self, other: impl Into<IntRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Lt, &self.0, &other.into().0))
    }

    pub fn le(&self, other: impl Into<IntRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Le, &self.0, &other.into().0))
    }
}

impl BoolRef {
    pub fn literal(name: impl Into<String>, value: bool) -> Self {
        Self(RefCore::known(name, Value::Bool(value)))
    }

    pub fn runtime(name: impl Into<String>, source: RuntimeSource) -> Self {
        Self(RefCore::runtime(name, source))
    }

    pub fn value(&self) -> Option<bool> {
        self.0.value().and_then(Value::as_bool)
    }

    pub fn and(&self, other: impl Into<BoolRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::And, &self.0, &other.into().0))
    }

    pub fn or(&self, other: impl Into<BoolRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Or, &self.0, &other.into().0))
    }

    pub fn not(&self) -> BoolRef {
        BoolRef(derive_total_unary(UnaryOp::Not, &self.0))
    }

    pub fn equals(&self, other: impl Into<BoolRef>) -> BoolRef {
        BoolRef(derive_total(BinaryOp::Eq, &self.0, &other.into().0))
    }
}

impl ObjectRef {
    /// # Errors
    ///
    /// [`RefError::NotAnObject`] if `value` is not a JSON object.
    pub fn literal(name: impl Into<String>, value: Value) -> Result<Self, RefError> {
        let name = name.into();
        if !value.is_object() {
            return Err(RefError::NotAnObject { name });
        }
        Ok(Self(RefCore::known(name, value)))
    }

    /// A runtime-local binding, e.g. the item of a `FOR` loop.
    pub fn local(name: &str) -> Self {
        Self(RefCore::local(name))
    }

    pub fn value(&self) -> Option<&Map<String, Value>> {
        self.0.value().and_then(Value::as_object)
    }

    /// # Errors
    ///
    /// [`RefError::FieldNotFound`] when this object is known and has no `key`.
    pub fn field(&self, key: &str) -> Result<ValueRef, RefError> {
        self.0.field(key).map(ValueRef)
    }
}

impl ValueRef {
    pub fn value(&self) -> Option<&Value> {
        self.0.value()
    }

    /// Narrow to a string ref. Unknown values narrow to any type.
    pub fn as_string(&self) -> Option<StringRef> {
        self.narrow(Value::is_string).map(StringRef)
    }

    pub fn as_int(&self) -> Option<IntRef> {
        self.narrow(|v| v.as_i64().is_some()).map(IntRef)
    }

    pub fn as_bool(&self) -> Option<BoolRef> {
        self.narrow(Value::is_boolean).map(BoolRef)
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        self.narrow(Value::is_object).map(ObjectRef)
    }

    /// # Errors
    ///
    /// See [`ObjectRef::field`].
    pub fn field(&self, key: &str) -> Result<ValueRef, RefError> {
        self.0.field(key).map(ValueRef)
    }

    fn narrow(&self, check: impl Fn(&Value) -> bool) -> Option<RefCore> {
        match self.0.value() {
            Some(v) if !check(v) => None,
            _ => Some(self.0.clone()),
        }
    }
}

impl From<&str> for StringRef {
    fn from(s: &str) -> Self {
        StringRef::literal(LITERAL_NAME, s)
    }
}

impl From<String> for StringRef {
    fn from(s: String) -> Self {
        StringRef::literal(LITERAL_NAME, s)
    }
}

impl From<i64> for IntRef {
    fn from(n: i64) -> Self {
        IntRef::literal(LITERAL_NAME, n)
    }
}

impl From<i32> for IntRef {
    fn from(n: i32) -> Self {
        IntRef::literal(LITERAL_NAME, i64::from(n))
    }
}

impl From<bool> for BoolRef {
    fn from(b: bool) -> Self {
        BoolRef::literal(LITERAL_NAME, b)
    }
}

// ---------------------------------------------------------------------------
// Ref
// ---------------------------------------------------------------------------

/// A typed ref of any kind, as stored in a context.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref {
    String(StringRef),
    Int(IntRef),
    Bool(BoolRef),
    Object(ObjectRef),
}

impl Ref {
    pub fn core(&self) -> &RefCore {
        match self {
            Ref::String(r) => r.core(),
            Ref::Int(r) => r.core(),
            Ref::Bool(r) => r.core(),
            Ref::Object(r) => r.core(),
        }
    }

    pub fn name(&self) -> &str {
        self.core().name()
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

    fn env_string(name: &str) -> StringRef {
        StringRef::runtime(name, RuntimeSource::Env(name.to_uppercase()))
    }

    // -- folding -----------------------------------------------------------

    #[test]
    fn known_concat_folds() {
        let base = StringRef::literal("base", "https://api.x.com");
        let url = base.concat("/users");
        assert!(url.is_known());
        assert_eq!(url.value(), Some("https://api.x.com/users"));
        assert_eq!(url.expression(), None);
    }

    #[test]
    fn known_string_transforms_fold() {
        let s = StringRef::literal("s", "Hello");
        assert_eq!(s.upper().value(), Some("HELLO"));
        assert_eq!(s.lower().value(), Some("hello"));
        assert_eq!(s.prepend(">> ").value(), Some(">> Hello"));
        assert_eq!(s.append("!").value(), Some("Hello!"));
        assert_eq!(s.equals("Hello").value(), Some(true));
        assert_eq!(s.lt("World").value(), Some(true));
    }

    #[test]
    fn known_int_arithmetic_folds() {
        let n = IntRef::literal("n", 10);
        assert_eq!(n.add(5).unwrap().value(), Some(15));
        assert_eq!(n.subtract(15).unwrap().value(), Some(-5));
        assert_eq!(n.multiply(3).unwrap().value(), Some(30));
        assert_eq!(n.divide(4).unwrap().value(), Some(2));
        assert_eq!(n.ge(10).value(), Some(true));
        assert_eq!(n.not_equals(10).value(), Some(false));
    }

    #[test]
    fn int_overflow_is_an_error() {
        let n = IntRef::literal("n", i64::MAX);
        assert_eq!(
            n.multiply(2).unwrap_err(),
            RefError::IntegerOverflow { op: "mul".into() }
        );
        assert_eq!(n.divide(0).unwrap_err(), RefError::DivisionByZero);
    }

    #[test]
    fn known_bool_logic_folds() {
        let t = BoolRef::literal("t", true);
        assert_eq!(t.and(false).value(), Some(false));
        assert_eq!(t.or(false).value(), Some(true));
        assert_eq!(t.not().value(), Some(false));
    }

    // -- deferral ----------------------------------------------------------

    #[test]
    fn unknown_operand_defers() {
        let host = env_string("host");
        let url = StringRef::literal("scheme", "https://").concat(&host).append("/v1");
        assert!(!url.is_known());
        assert_eq!(
            url.expression().unwrap(),
            r#"${ "https://" + $context.host + "/v1" }"#
        );
    }

    #[test]
    fn unknown_is_contagious() {
        let limit = IntRef::runtime("limit", RuntimeSource::Input("limit".into()));
        let doubled = limit.multiply(2).unwrap().add(1).unwrap();
        assert!(!doubled.is_known());
        assert_eq!(
            doubled.expression().unwrap(),
            "${ ($context.limit * 2) + 1 }"
        );
        let check = doubled.gt(IntRef::literal("max", 100));
        assert_eq!(check.expression().unwrap(), "${ (($context.limit * 2) + 1) > 100 }");
    }

    #[test]
    fn operand_order_is_preserved() {
        let a = env_string("a");
        let b = env_string("b");
        assert_eq!(
            b.prepend(&a).expression().unwrap(),
            "${ $context.a + $context.b }"
        );
        let flag = BoolRef::runtime("flag", RuntimeSource::Env("FLAG".into()));
        assert_eq!(
            BoolRef::literal("t", true).and(&flag).expression().unwrap(),
            "${ true and $context.flag }"
        );
        assert_eq!(flag.not().expression().unwrap(), "${ ($context.flag | not) }");
    }

    #[test]
    fn unknown_division_by_zero_defers() {
        let n = IntRef::runtime("n", RuntimeSource::Env("N".into()));
        assert_eq!(n.divide(0).unwrap().expression().unwrap(), "${ ($context.n / 0 | trunc) }");
    }

    // -- objects -----------------------------------------------------------

    #[test]
    fn known_object_field_access() {
        let cfg = ObjectRef::literal("cfg", json!({"region": "eu", "retries": 3})).unwrap();
        let region = cfg.field("region").unwrap().as_string().unwrap();
        assert_eq!(region.value(), Some("eu"));
        assert_eq!(region.name(), "cfg.region");
        assert!(cfg.field("region").unwrap().as_int().is_none());
        assert_eq!(cfg.field("retries").unwrap().as_int().unwrap().value(), Some(3));
    }

    #[test]
    fn missing_field_fails_fast() {
        let cfg = ObjectRef::literal("cfg", json!({"region": "eu"})).unwrap();
        let err = cfg.field("zone").unwrap_err();
        assert!(err.is_field_not_found());
        assert_eq!(err.to_string(), "field 'zone' not found in object 'cfg'");
    }

    #[test]
    fn non_object_literal_rejected() {
        assert!(ObjectRef::literal("x", json!([1, 2])).is_err());
    }

    #[test]
    fn local_field_access_defers() {
        let item = ObjectRef::local("item");
        let id = item.field("id").unwrap().as_string().unwrap();
        assert_eq!(id.expression().unwrap(), "${ $item.id }");
    }

    #[test]
    fn total_operators_on_known_operands_stay_known() {
        let a = StringRef::literal("a", "x");
        let n = IntRef::literal("n", 3);
        let t = BoolRef::literal("t", true);
        assert!(a.upper().is_known());
        assert!(a.lower().is_known());
        assert!(a.equals("x").is_known());
        assert!(a.gt("w").is_known());
        assert!(n.le(4).is_known());
        assert!(n.not_equals(4).is_known());
        assert!(t.and(false).is_known());
        assert!(t.or(false).is_known());
        assert!(t.not().is_known());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "failed on a known operand")]
    fn mistyped_known_core_is_caught_in_debug_builds() {
        let _ = StringRef::from_core(RefCore::known("n", json!(5))).upper();
    }

    // -- secrets -----------------------------------------------------------

    #[test]
    fn secret_propagates_through_derivation() {
        let token = StringRef::secret("token", "s3cr3t");
        let header = token.prepend("Bearer ");
        assert!(header.is_secret());
        assert_eq!(header.value(), Some("Bearer s3cr3t"));
        assert!(token.upper().is_secret());
        assert!(token.equals("x").is_secret());
    }

    #[test]
    fn secret_runtime_source_is_secret() {
        let key = StringRef::runtime("key", RuntimeSource::Secret("API_KEY".into()));
        assert!(key.is_secret());
        assert!(!env_string("plain").is_secret());
    }

    #[test]
    fn debug_redacts_secret_values() {
        let token = StringRef::secret("token", "s3cr3t");
        let out = format!("{token:?}");
        assert!(out.contains("<redacted>"));
        assert!(!out.contains("s3cr3t"));
        assert!(format!("{:?}", StringRef::literal("a", "visible")).contains("visible"));
    }
}
