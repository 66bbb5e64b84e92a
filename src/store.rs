//! In-memory chunk repository.
//!
//! The store owns every [`Chunk`] for the life of the process and is
//! read-only once loading finishes. Hits reference chunks by
//! `(doc_id, chunk_id)` and resolve them here; a missing key is an absent
//! `Option`, never an error.

use std::collections::HashMap;

use crate::models::Chunk;

#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: HashMap<(String, String), Chunk>,
    titles: HashMap<String, String>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk, replacing any previous chunk with the same identity.
    pub fn add_chunk(&mut self, chunk: Chunk) {
        self.chunks
            .insert((chunk.doc_id.clone(), chunk.chunk_id.clone()), chunk);
    }

    pub fn get_chunk(&self, doc_id: &str, chunk_id: &str) -> Option<&Chunk> {
        self.chunks
            .get(&(doc_id.to_string(), chunk_id.to_string()))
    }

    /// Iterate over every stored chunk. Iteration order is unspecified;
    /// callers that rank chunks must impose their own ordering.
    pub fn all_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn set_document_title(&mut self, doc_id: impl Into<String>, title: impl Into<String>) {
        self.titles.insert(doc_id.into(), title.into());
    }

    pub fn get_document_title(&self, doc_id: &str) -> Option<&str> {
        self.titles.get(doc_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
