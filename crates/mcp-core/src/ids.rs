//! Wire-level identifiers shared by every layer of the session engine.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A JSON-RPC request/response identifier.
///
/// Per spec.md §3 (Invariant M1), an `id` may be a JSON string or integer but
/// never null on a [`crate::jsonrpc`]-level Request. Peers MUST accept either
/// representation on the wire (spec.md §4.5.2), so both variants round-trip
/// through serde without normalization at this layer — normalization to a
/// canonical string happens in the session engine's pending-request table,
/// not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    /// A string identifier, e.g. the session engine's own generated ids.
    String(String),
    /// An integer identifier, as some peers emit.
    Number(i64),
}

impl RequestId {
    /// Render this id as the canonical string form used to key the
    /// pending-request table, regardless of its wire representation.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<u64> for RequestId {
    fn from(n: u64) -> Self {
        Self::String(n.to_string())
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_i64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RequestIdVisitor;

        impl<'de> Visitor<'de> for RequestIdVisitor {
            type Value = RequestId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON-RPC id (string or integer)")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(RequestId::String(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(RequestId::String(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(RequestId::Number(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                // JSON-RPC ids are practically always within i64 range.
                i64::try_from(v)
                    .map(RequestId::Number)
                    .map_err(|_| de::Error::custom("request id out of i64 range"))
            }
        }

        deserializer.deserialize_any(RequestIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_string_and_number() {
        for id in [RequestId::from("abc"), RequestId::from(42i64)] {
            let json = serde_json::to_string(&id).unwrap();
            let back: RequestId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, back);
        }
    }

    #[test]
    fn canonical_form_is_stable_across_wire_types() {
        assert_eq!(RequestId::from(7i64).canonical(), "7");
        assert_eq!(RequestId::from("7").canonical(), "7");
    }
}
