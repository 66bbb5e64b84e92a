//! Chunk file loading.
//!
//! The corpus arrives pre-chunked as a single JSON file of documents,
//! sections, and chunks. The loader walks that tree, registers every chunk
//! in a [`ChunkStore`], and records document titles. Offsets are carried
//! through verbatim; a malformed or missing offset becomes 0 rather than a
//! load failure, while a missing `docId`, `chunkId`, or `content` aborts
//! the load.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::store::ChunkStore;

#[derive(Debug, Deserialize)]
struct ChunkFile {
    #[serde(default)]
    documents: Vec<DocumentRecord>,
}

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    #[serde(rename = "docId")]
    doc_id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    sections: Vec<SectionRecord>,
}

#[derive(Debug, Deserialize)]
struct SectionRecord {
    #[serde(rename = "sectionId", default)]
    section_id: String,
    #[serde(default)]
    chunks: Vec<ChunkRecord>,
}

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    #[serde(rename = "chunkId")]
    chunk_id: Option<String>,
    content: Option<String>,
    #[serde(rename = "startOffset", default, deserialize_with = "offset_or_zero")]
    start_offset: u64,
    #[serde(rename = "endOffset", default, deserialize_with = "offset_or_zero")]
    end_offset: u64,
}

/// Accept any JSON value in an offset position; anything that is not a
/// non-negative integer becomes 0.
fn offset_or_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().unwrap_or(0))
}

/// Load the chunk file at `path` into a fresh [`ChunkStore`].
pub fn load_chunks(path: &Path) -> Result<ChunkStore> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read chunk file {}: {e}", path.display())))?;
    let file: ChunkFile = serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse chunk file {}: {e}", path.display())))?;

    let mut store = ChunkStore::new();
    for doc in file.documents {
        let doc_id = doc.doc_id.ok_or_else(|| {
            Error::Config(format!("invalid document in {}: docId not found", path.display()))
        })?;
        if let Some(title) = doc.title.filter(|t| !t.is_empty()) {
            store.set_document_title(doc_id.as_str(), title);
        }
        for section in doc.sections {
            for chunk in section.chunks {
                let (chunk_id, content) = match (chunk.chunk_id, chunk.content) {
                    (Some(id), Some(text)) => (id, text),
                    _ => {
                        return Err(Error::Config(format!(
                            "invalid chunk in {} (document {doc_id}): missing chunkId or content",
                            path.display()
                        )))
                    }
                };
                store.add_chunk(Chunk {
                    doc_id: doc_id.clone(),
                    chunk_id,
                    section_id: section.section_id.clone(),
                    text: content,
                    start_offset: chunk.start_offset,
                    end_offset: chunk.end_offset,
                });
            }
        }
    }
    Ok(store)
}
