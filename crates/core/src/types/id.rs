//! Newtype IDs for type-safe entity references.
//!
//! The backend owns every id and the client never inspects one, so ids are
//! opaque: they deserialize from either a JSON string or a JSON integer and
//! serialize back in the same form they arrived in.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Raw id as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    /// Integer id (e.g. an auto-increment primary key).
    Number(i64),
    /// String id (e.g. a UUID or cuid).
    Text(String),
}

impl RawId {
    /// Interpret user input as an id.
    ///
    /// Input that is a plain integer becomes [`RawId::Number`] so that it
    /// compares equal to integer ids returned by the backend.
    #[must_use]
    pub fn from_input(s: &str) -> Self {
        let s = s.trim();
        s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_owned()), Self::Number)
    }

    /// Whether this id is written as `input`, whatever its wire form.
    ///
    /// `Text("12")` and `Number(12)` both read as `"12"`, so user input can
    /// be matched against ids the backend returned.
    #[must_use]
    pub fn reads_as(&self, input: &str) -> bool {
        let input = input.trim();
        match self {
            Self::Number(n) => input.parse::<i64>().is_ok_and(|i| i == *n),
            Self::Text(s) => s == input,
        }
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`RawId`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `Display` and `FromStr` (via [`RawId::from_input`])
///
/// # Example
///
/// ```rust
/// # use shopkeep_core::define_id;
/// define_id!(WidgetId);
///
/// let id: WidgetId = "42".parse().unwrap();
/// assert_eq!(id.to_string(), "42");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($crate::RawId);

        impl $name {
            /// Create an id from a raw wire value.
            #[must_use]
            pub const fn new(raw: $crate::RawId) -> Self {
                Self(raw)
            }

            /// Get the underlying raw value.
            #[must_use]
            pub const fn raw(&self) -> &$crate::RawId {
                &self.0
            }

            /// Whether this id is written as `input`. See [`RawId::reads_as`].
            #[must_use]
            pub fn reads_as(&self, input: &str) -> bool {
                self.0.reads_as(input)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::convert::Infallible;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Ok(Self($crate::RawId::from_input(s)))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self($crate::RawId::Number(id))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self($crate::RawId::from_input(id))
            }
        }
    };
}

define_id!(CategoryId);
define_id!(ProductId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_integer_and_string_ids() {
        let a: CategoryId = serde_json::from_str("7").unwrap();
        let b: CategoryId = serde_json::from_str("\"c1x9\"").unwrap();
        assert_eq!(a, CategoryId::from(7));
        assert_eq!(b.raw(), &RawId::Text("c1x9".to_owned()));
    }

    #[test]
    fn test_serializes_in_wire_form() {
        assert_eq!(serde_json::to_string(&ProductId::from(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ProductId::from("abc")).unwrap(),
            "\"abc\""
        );
    }

    #[test]
    fn test_input_matches_backend_ids() {
        let typed: ProductId = " 12 ".parse().unwrap();
        let wire: ProductId = serde_json::from_str("12").unwrap();
        assert_eq!(typed, wire);
    }

    #[test]
    fn test_string_backend_ids_read_as_typed_digits() {
        let wire: CategoryId = serde_json::from_str("\"12\"").unwrap();
        assert_ne!(wire, CategoryId::from("12"));
        assert!(wire.reads_as("12"));
        assert!(wire.reads_as(" 12 "));
        assert!(!wire.reads_as("13"));
        assert!(CategoryId::from(12).reads_as("12"));
        assert!(!CategoryId::from(12).reads_as("twelve"));
    }

    #[test]
    fn test_display() {
        assert_eq!(CategoryId::from("electronics").to_string(), "electronics");
        assert_eq!(CategoryId::from(5).to_string(), "5");
    }
}
