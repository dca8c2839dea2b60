//! Type-safe trace identifiers using the TypeID specification
//!
//! Every [`ErrorModel`](crate::envelope::ErrorModel) carries a [`TraceId`] that
//! correlates a client-visible failure with the server log line written for it.
//!
//! ```rust
//! use crud_scaffold::ids::TraceId;
//!
//! let trace_id = TraceId::new();
//! assert!(trace_id.as_str().starts_with("trace_"));
//! ```
//!
//! Trace ids use UUIDv4: they are drawn from fresh randomness on every call, so
//! concurrent requests never need to coordinate to stay collision-free.

use mti::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A per-error correlation identifier.
///
/// # Format
///
/// `trace_<base32-encoded-uuidv4>`, e.g. `trace_01h455vb4pex5vsknk084sn02q`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(MagicTypeId);

impl TraceId {
    /// The prefix used for trace IDs
    pub const PREFIX: &'static str = "trace";

    /// Creates a fresh trace ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V4>())
    }

    /// Returns the trace ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TraceId {
    type Err = TraceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mti = MagicTypeId::from_str(s).map_err(TraceIdError::Parse)?;

        if mti.prefix().as_str() != Self::PREFIX {
            return Err(TraceIdError::InvalidPrefix {
                actual: mti.prefix().as_str().to_string(),
            });
        }

        Ok(Self(mti))
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TraceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for trace ID parsing.
#[derive(Debug, thiserror::Error)]
pub enum TraceIdError {
    /// The ID could not be parsed as a valid TypeID.
    #[error("failed to parse trace ID: {0}")]
    Parse(#[from] MagicTypeIdError),

    /// The prefix was not `trace`.
    #[error("invalid prefix: expected 'trace', got '{actual}'")]
    InvalidPrefix {
        /// The actual prefix found.
        actual: String,
    },
}
