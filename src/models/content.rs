//! Content identity: cid (content hash) and etag (on-disk metadata snapshot).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Hash of a file's content. Sixteen lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// Placeholder for files whose content has not been hashed yet.
    pub const ZERO: &'static str = "0000000000000000";

    pub fn of(content: &str) -> Self {
        let digest = Sha256::digest(content.as_bytes());
        let mut hex = String::with_capacity(16);
        for byte in &digest[..8] {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{modify_time_ms, size}` snapshot of a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Etag {
    pub modify_time_ms: u64,
    pub size: u64,
}

impl Etag {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modify_time_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            modify_time_ms,
            size: metadata.len(),
        }
    }

    /// Modify time as a timestamp, epoch start when unknown.
    pub fn modified_at(&self) -> DateTime<Utc> {
        i64::try_from(self.modify_time_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_default()
    }
}
