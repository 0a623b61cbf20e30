//! Error types for ref derivation and task config access.

/// Errors raised while deriving or narrowing refs at build time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefError {
    /// A known object was asked for a key it does not contain.
    #[error("field '{key}' not found in object '{object}'")]
    FieldNotFound {
        /// Name of the object ref that was accessed.
        object: String,
        /// The missing key.
        key: String,
    },

    /// Field access on a known value that is not an object.
    #[error("ref '{name}' is not an object")]
    NotAnObject {
        /// Name of the ref that was accessed.
        name: String,
    },

    /// Folding an integer operation overflowed `i64`.
    #[error("integer overflow while folding '{op}'")]
    IntegerOverflow {
        /// Operator label (e.g. `add`).
        op: String,
    },

    /// Folding an integer division with a known zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// An operator was applied to known values of the wrong shape.
    #[error("cannot apply '{op}' to {found}")]
    TypeMismatch {
        /// Operator or conversion label.
        op: String,
        /// Description of the offending value types.
        found: String,
    },
}

impl RefError {
    /// Creates a [`RefError::TypeMismatch`].
    pub fn type_mismatch(op: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            op: op.into(),
            found: found.into(),
        }
    }

    /// Returns `true` if this is a [`RefError::FieldNotFound`].
    pub fn is_field_not_found(&self) -> bool {
        matches!(self, Self::FieldNotFound { .. })
    }
}

/// Errors raised when a task's config is read through the wrong kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    /// The config variant does not match the required task kind.
    #[error("task '{task}' has a {actual} config where {expected} is required")]
    InvalidTaskConfig {
        /// Task name.
        task: String,
        /// Kind that was required.
        expected: String,
        /// Kind found instead.
        actual: String,
    },
}

/// A config value that has no representation in the manifest.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot encode '{path}': {reason}")]
pub struct EncodeError {
    /// Dotted path of the offending value, relative to the encoded root.
    pub path: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl EncodeError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the path with an outer segment.
    pub fn within(mut self, outer: &str) -> Self {
        self.path = match (outer.is_empty(), self.path.is_empty()) {
            (true, _) => self.path,
            (false, true) => outer.to_string(),
            (false, false) if self.path.starts_with('[') => format!("{outer}{}", self.path),
            (false, false) => format!("{outer}.{}", self.path),
        };
        self
    }
}
