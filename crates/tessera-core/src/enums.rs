//! String-backed enums used in task records.
//!
//! Each enum serializes as its wire string and deserializes known strings
//! to their variant, anything else to the `Custom` fallback.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: an enum with known string variants + a Custom(String) fallback.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// Every built-in variant, in declaration order.
            pub const BUILTIN: &'static [$name] = &[$( Self::$variant, )+];

            /// Returns the wire string.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

define_enum!(
    /// The kind tag of a task.
    TaskKind, custom_variant = Custom,
    variants: [
        (Set, "SET"),
        (HttpCall, "HTTP_CALL"),
        (GrpcCall, "GRPC_CALL"),
        (Switch, "SWITCH"),
        (For, "FOR"),
        (Fork, "FORK"),
        (Try, "TRY"),
        (Listen, "LISTEN"),
        (Wait, "WAIT"),
        (CallActivity, "CALL_ACTIVITY"),
        (Raise, "RAISE"),
        (Run, "RUN"),
    ]
);

define_enum!(
    /// HTTP request method of an `HTTP_CALL` task.
    HttpMethod, custom_variant = Other,
    variants: [
        (Get, "GET"),
        (Post, "POST"),
        (Put, "PUT"),
        (Patch, "PATCH"),
        (Delete, "DELETE"),
        (Head, "HEAD"),
        (Options, "OPTIONS"),
    ]
);

impl Default for HttpMethod {
    fn default() -> Self {
        Self::Get
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn task_kind_round_trips_known_strings() {
        for kind in TaskKind::BUILTIN {
            assert_eq!(&TaskKind::from(kind.as_str()), kind);
        }
        assert_eq!(TaskKind::BUILTIN.len(), 12);
    }

    #[test]
    fn unknown_kind_falls_back_to_custom() {
        let kind = TaskKind::from("EMIT");
        assert_eq!(kind, TaskKind::Custom("EMIT".into()));
        assert!(!kind.is_builtin());
        assert_eq!(kind.to_string(), "EMIT");
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&TaskKind::CallActivity).unwrap();
        assert_eq!(json, r#""CALL_ACTIVITY""#);
        let parsed: HttpMethod = serde_json::from_str(r#""PATCH""#).unwrap();
        assert_eq!(parsed, HttpMethod::Patch);
    }
}
