//! Config record and type tag
//!
//! The immutable unit of stored data and its payload format tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CfgError;

/// Payload format of a stored configuration blob.
///
/// Parsing is exact and case-sensitive: `"json"` and `"yaml"` are the only
/// accepted wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Json,
    Yaml,
}

impl TypeTag {
    /// The wire string for this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Json => "json",
            TypeTag::Yaml => "yaml",
        }
    }
}

impl FromStr for TypeTag {
    type Err = CfgError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "json" => Ok(TypeTag::Json),
            "yaml" => Ok(TypeTag::Yaml),
            other => Err(CfgError::InvalidType(other.to_string())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable, versioned configuration entry.
///
/// Exactly one record exists per (key, version) pair; versions for a key
/// start at 1 and are contiguous. Once durably written a record is never
/// mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Opaque unique identifier, assigned at construction
    pub id: Uuid,

    /// Name under which the blob is stored
    pub key: String,

    /// Version number, >= 1
    pub version: u64,

    /// The configuration payload
    pub data: String,

    /// Payload format
    pub tag: TypeTag,
}

impl ConfigRecord {
    /// Build a new record with a fresh id.
    pub fn new(key: impl Into<String>, data: impl Into<String>, tag: TypeTag, version: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
            version,
            data: data.into(),
            tag,
        }
    }
}
