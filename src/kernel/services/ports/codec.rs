//! Structured document contract: text ⇄ block state.

use crate::kernel::language::FileType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{file_type:?} has no structured representation")]
    Unsupported { file_type: FileType },
    #[error("malformed document state: {0}")]
    Malformed(String),
}

/// Serialized structured document, as cached on an editor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentState(pub serde_json::Value);

pub trait DocumentCodec: Send + Sync {
    /// Re-derives structured blocks from committed text.
    fn parse(&self, file_type: FileType, text: &str) -> Result<DocumentState, CodecError>;

    /// Flattens cached blocks back to plain text.
    fn serialize(&self, file_type: FileType, state: &DocumentState) -> Result<String, CodecError>;
}
