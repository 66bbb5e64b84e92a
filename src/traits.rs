//! Stage interfaces.
//!
//! Each pipeline stage is programmed against one of these traits; the
//! concrete implementation is chosen by the config at load time. The
//! signatures mirror the data flow: question → intent → terms → hits →
//! reranked hits → answer.

use crate::models::{Answer, Hit, Intent};
use crate::store::ChunkStore;

/// Classifies the raw question into one of the closed intent variants.
pub trait IntentDetector {
    fn detect(&self, question: &str) -> Intent;
}

/// Rewrites the question into an ordered, deduplicated term list.
pub trait QueryWriter {
    fn write(&self, question: &str, intent: Intent) -> Vec<String>;
}

/// Scores every chunk in the store and returns the top hits.
pub trait Retriever {
    fn retrieve(&self, terms: &[String], store: &ChunkStore) -> Vec<Hit>;
}

/// Rescales retrieval scores and applies proximity and title bonuses.
pub trait Reranker {
    fn rerank(&self, terms: &[String], hits: &[Hit], store: &ChunkStore) -> Vec<Hit>;
}

/// Produces the final answer text and citations from the top hits.
pub trait AnswerAgent {
    fn answer(&self, terms: &[String], hits: &[Hit], store: &ChunkStore) -> Answer;
}
