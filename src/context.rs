//! Per-request pipeline state.
//!
//! The context is created for a single question, threaded through the five
//! stages, and returned by the orchestrator. Each field is written exactly
//! once by its producing stage. It is never shared across runs and carries
//! no synchronisation.

use crate::intent::IntentRules;
use crate::models::{Answer, Hit, Intent, Query};
use crate::store::ChunkStore;

#[derive(Debug)]
pub struct Context {
    pub question: Query,
    pub store: ChunkStore,
    pub intent: Option<Intent>,
    pub intent_rules: Option<IntentRules>,
    pub terms: Option<Vec<String>>,
    pub retrieved_hits: Option<Vec<Hit>>,
    pub reranked_hits: Option<Vec<Hit>>,
    pub final_answer: Option<Answer>,
}

impl Context {
    pub fn new(question: Query, store: ChunkStore) -> Self {
        Self {
            question,
            store,
            intent: None,
            intent_rules: None,
            terms: None,
            retrieved_hits: None,
            reranked_hits: None,
            final_answer: None,
        }
    }
}
