//! Score-rescaling reranker with proximity and title bonuses.
//!
//! Each retriever hit is re-scored as `base × 10`, plus a proximity bonus
//! when the query has at least two terms and any two term occurrences in
//! the chunk text fall within the proximity window, plus a title boost
//! (applied once) when the document title contains any query term. The
//! proximity scan collects every occurrence of every term, so two close
//! occurrences of the same term qualify. Positions are in character units,
//! keeping the window stable across multi-byte letters.
//!
//! Hits whose chunk no longer resolves are dropped. Input hits are never
//! mutated; the reranker emits fresh [`Hit`] values and re-sorts them with
//! the shared ranking order.

use crate::models::Hit;
use crate::store::ChunkStore;
use crate::text::{char_positions, lowercase_turkish};
use crate::traits::Reranker;

pub const DEFAULT_PROXIMITY_WINDOW: usize = 15;
pub const DEFAULT_PROXIMITY_BONUS: i64 = 5;
pub const DEFAULT_TITLE_BOOST: i64 = 3;

pub struct SimpleReranker {
    proximity_window: usize,
    proximity_bonus: i64,
    title_boost: i64,
}

impl SimpleReranker {
    pub fn new(proximity_window: usize, proximity_bonus: i64, title_boost: i64) -> Self {
        Self {
            proximity_window,
            proximity_bonus,
            title_boost,
        }
    }

    /// True when any two term occurrences in `text_lower` are at most
    /// `proximity_window` characters apart.
    fn terms_within_window(&self, text_lower: &str, terms_lower: &[String]) -> bool {
        let mut positions: Vec<usize> = Vec::new();
        for term in terms_lower {
            positions.extend(char_positions(text_lower, term));
        }
        if positions.len() < 2 {
            return false;
        }
        positions.sort_unstable();
        positions
            .windows(2)
            .any(|pair| pair[1] - pair[0] <= self.proximity_window)
    }
}

impl Default for SimpleReranker {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROXIMITY_WINDOW,
            DEFAULT_PROXIMITY_BONUS,
            DEFAULT_TITLE_BOOST,
        )
    }
}

impl Reranker for SimpleReranker {
    fn rerank(&self, terms: &[String], hits: &[Hit], store: &ChunkStore) -> Vec<Hit> {
        if hits.is_empty() {
            return Vec::new();
        }

        let terms_lower: Vec<String> = terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| lowercase_turkish(t))
            .collect();

        let mut reranked: Vec<Hit> = Vec::new();
        for hit in hits {
            let chunk = match store.get_chunk(&hit.doc_id, &hit.chunk_id) {
                Some(chunk) => chunk,
                None => continue,
            };

            let mut score = hit.score * 10;

            if terms_lower.len() >= 2 {
                let text_lower = lowercase_turkish(&chunk.text);
                if self.terms_within_window(&text_lower, &terms_lower) {
                    score += self.proximity_bonus;
                }
            }

            if let Some(title) = store.get_document_title(&hit.doc_id) {
                let title_lower = lowercase_turkish(title);
                if terms_lower.iter().any(|t| title_lower.contains(t.as_str())) {
                    score += self.title_boost;
                }
            }

            reranked.push(Hit::new(&hit.doc_id, &hit.chunk_id, score));
        }

        reranked.sort_by(Hit::by_rank);
        reranked
    }
}
