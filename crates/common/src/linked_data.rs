use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use blob_store::Cid;

/// Errors parsing a location handle
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("invalid content id '{0}': {1}")]
    InvalidCid(String, String),
}

/// Opaque, content-derived reference to a published blob
///
/// Wraps the CID returned by the storage layer. Identical bytes always map to
/// the same handle. The text form is what gets written to the registry
/// record's `uri` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationHandle(Cid);

impl LocationHandle {
    /// Handle a blob would get if published, without publishing it.
    pub fn for_content(data: &[u8]) -> Self {
        LocationHandle(blob_store::content_id(data))
    }

    pub fn cid(&self) -> &Cid {
        &self.0
    }
}

impl From<Cid> for LocationHandle {
    fn from(cid: Cid) -> Self {
        LocationHandle(cid)
    }
}

impl From<LocationHandle> for Cid {
    fn from(handle: LocationHandle) -> Self {
        handle.0
    }
}

impl std::fmt::Display for LocationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocationHandle {
    type Err = LocationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // tolerate the gateway-style prefix older clients wrote
        let raw = s.strip_prefix("ipfs://").unwrap_or(s);
        Cid::try_from(raw)
            .map(LocationHandle)
            .map_err(|e| LocationError::InvalidCid(s.to_string(), e.to_string()))
    }
}

impl Serialize for LocationHandle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for LocationHandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
