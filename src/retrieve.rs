//! Keyword retrieval over the chunk store.
//!
//! Every chunk is scored by the sum, over all query terms, of
//! non-overlapping occurrences of the lowercased term in the lowercased
//! chunk text (`"aaa"` occurs twice in `"aaaa"`, not three times). Chunks
//! that score 0 are dropped, the rest are sorted score-descending with
//! `(doc_id, chunk_id)` ascending as the tie-break, and the list is cut to
//! `top_k`. The tie-break keeps the output independent of store iteration
//! order.

use crate::models::Hit;
use crate::store::ChunkStore;
use crate::text::lowercase_turkish;
use crate::traits::Retriever;

pub struct KeywordRetriever {
    top_k: usize,
}

impl KeywordRetriever {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl Retriever for KeywordRetriever {
    fn retrieve(&self, terms: &[String], store: &ChunkStore) -> Vec<Hit> {
        let lowered: Vec<String> = terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| lowercase_turkish(t))
            .collect();
        if lowered.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<Hit> = Vec::new();
        for chunk in store.all_chunks() {
            let text = lowercase_turkish(&chunk.text);
            let score: i64 = lowered
                .iter()
                .map(|term| text.matches(term.as_str()).count() as i64)
                .sum();
            if score > 0 {
                hits.push(Hit::new(&chunk.doc_id, &chunk.chunk_id, score));
            }
        }

        hits.sort_by(Hit::by_rank);
        hits.truncate(self.top_k);
        hits
    }
}
