//! Block codec for structured file types.
//!
//! Text is cut into blocks at blank lines. Each block keeps its raw text,
//! trailing blank lines included, so serializing a parsed document gives
//! back the exact input.

use crate::kernel::language::FileType;
use crate::kernel::services::ports::codec::{CodecError, DocumentCodec, DocumentState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    Heading { level: u8 },
    Code,
    Definition,
    Paragraph,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDocument {
    pub file_type: FileType,
    pub blocks: Vec<Block>,
}

impl BlockDocument {
    pub fn from_state(state: &DocumentState) -> Result<Self, CodecError> {
        serde_json::from_value(state.0.clone()).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    pub fn to_state(&self) -> Result<DocumentState, CodecError> {
        serde_json::to_value(self)
            .map(DocumentState)
            .map_err(|e| CodecError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockCodec;

impl BlockCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn blocks(file_type: FileType, text: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut current = String::new();
        let mut in_fence = false;
        let mut after_blank = false;

        for line in text.split_inclusive('\n') {
            let trimmed = line.trim();
            let is_fence = file_type == FileType::Markdown && trimmed.starts_with("```");

            if trimmed.is_empty() && !in_fence {
                current.push_str(line);
                after_blank = true;
                continue;
            }

            // Indented lines after a blank still belong to a Python body.
            let continues_body = file_type == FileType::Python
                && line.starts_with([' ', '\t'])
                && current.lines().any(|l| !l.trim().is_empty());
            if after_blank && !in_fence && !continues_body && !current.is_empty() {
                blocks.push(Self::finish(file_type, std::mem::take(&mut current)));
            }
            after_blank = false;

            if is_fence {
                in_fence = !in_fence;
            }
            current.push_str(line);
        }

        if !current.is_empty() {
            blocks.push(Self::finish(file_type, current));
        }
        blocks
    }

    fn finish(file_type: FileType, raw: String) -> Block {
        Block {
            kind: classify(file_type, &raw),
            raw,
        }
    }
}

fn classify(file_type: FileType, raw: &str) -> BlockKind {
    let Some(first) = raw.lines().find(|l| !l.trim().is_empty()) else {
        return BlockKind::Blank;
    };
    match file_type {
        FileType::Markdown => {
            let hashes = first.bytes().take_while(|&b| b == b'#').count();
            if (1..=6).contains(&hashes) && first[hashes..].starts_with(' ') {
                BlockKind::Heading {
                    level: hashes as u8,
                }
            } else if first.trim_start().starts_with("```") {
                BlockKind::Code
            } else {
                BlockKind::Paragraph
            }
        }
        FileType::Python => {
            let head = first.trim_start();
            if ["def ", "class ", "async def ", "@"]
                .iter()
                .any(|prefix| head.starts_with(prefix))
            {
                BlockKind::Definition
            } else {
                BlockKind::Paragraph
            }
        }
        _ => BlockKind::Paragraph,
    }
}

impl DocumentCodec for BlockCodec {
    fn parse(&self, file_type: FileType, text: &str) -> Result<DocumentState, CodecError> {
        if !file_type.is_structured() {
            return Err(CodecError::Unsupported { file_type });
        }
        BlockDocument {
            file_type,
            blocks: Self::blocks(file_type, text),
        }
        .to_state()
    }

    fn serialize(&self, file_type: FileType, state: &DocumentState) -> Result<String, CodecError> {
        if !file_type.is_structured() {
            return Err(CodecError::Unsupported { file_type });
        }
        let doc = BlockDocument::from_state(state)?;
        Ok(doc.blocks.into_iter().map(|b| b.raw).collect())
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/codec.rs"]
mod tests;
