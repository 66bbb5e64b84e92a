//! Core data models used throughout the answering pipeline.
//!
//! These types represent the question, the corpus chunks, and the retrieval
//! results that flow from stage to stage. All of them are plain values;
//! chunks are owned by the [`ChunkStore`](crate::store::ChunkStore) and hits
//! refer to them only by `(doc_id, chunk_id)`.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// The raw user question, as typed on the command line.
#[derive(Debug, Clone)]
pub struct Query {
    text: String,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Coarse question-type label drawn from a closed set.
///
/// Anything that matches no rule resolves to [`Intent::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Registration,
    StaffLookup,
    PolicyFaq,
    Course,
    Unknown,
}

impl Intent {
    /// Parse an intent name as it appears in the rules file
    /// (`registration`, `staff_lookup`, ...). Case-insensitive.
    pub fn parse_name(name: &str) -> Result<Intent> {
        match name.trim().to_uppercase().as_str() {
            "REGISTRATION" => Ok(Intent::Registration),
            "STAFF_LOOKUP" => Ok(Intent::StaffLookup),
            "POLICY_FAQ" => Ok(Intent::PolicyFaq),
            "COURSE" => Ok(Intent::Course),
            "UNKNOWN" => Ok(Intent::Unknown),
            other => Err(Error::Config(format!("unknown intent name: {other}"))),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Registration => "Registration",
            Intent::StaffLookup => "StaffLookup",
            Intent::PolicyFaq => "PolicyFAQ",
            Intent::Course => "Course",
            Intent::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A contiguous span of a source document, the atomic unit of retrieval.
///
/// `start_offset`/`end_offset` locate the span in the original document.
/// They are taken verbatim from the chunk file and reproduced verbatim in
/// citations; the pipeline never reinterprets them.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_id: String,
    pub section_id: String,
    pub text: String,
    pub start_offset: u64,
    pub end_offset: u64,
}

/// A `(doc_id, chunk_id, score)` triple produced by retrieval or reranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub doc_id: String,
    pub chunk_id: String,
    pub score: i64,
}

impl Hit {
    pub fn new(doc_id: impl Into<String>, chunk_id: impl Into<String>, score: i64) -> Self {
        Self {
            doc_id: doc_id.into(),
            chunk_id: chunk_id.into(),
            score,
        }
    }

    /// Ranking order shared by the retriever and the reranker: score
    /// descending, then `doc_id` ascending, then `chunk_id` ascending.
    pub fn by_rank(a: &Hit, b: &Hit) -> Ordering {
        b.score
            .cmp(&a.score)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.doc_id, self.chunk_id, self.score)
    }
}

/// The final answer text plus its citations.
///
/// Each citation is a string `docId:sectionId:start-end` uniquely locating
/// a chunk span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<String>,
}

impl Answer {
    pub fn new(text: impl Into<String>, citations: Vec<String>) -> Self {
        Self {
            text: text.into(),
            citations,
        }
    }

    /// Render the answer as the single line printed by the CLI.
    pub fn to_single_line(&self) -> String {
        if self.citations.is_empty() {
            self.text.clone()
        } else {
            format!("{} See: {}", self.text, self.citations.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_names_round_trip() {
        for (name, intent) in [
            ("registration", Intent::Registration),
            ("STAFF_LOOKUP", Intent::StaffLookup),
            ("Policy_Faq", Intent::PolicyFaq),
            ("course", Intent::Course),
            ("unknown", Intent::Unknown),
        ] {
            assert_eq!(Intent::parse_name(name).unwrap(), intent);
        }
    }

    #[test]
    fn test_intent_unknown_name_is_an_error() {
        assert!(Intent::parse_name("smalltalk").is_err());
    }

    #[test]
    fn test_hit_rank_prefers_score_then_ids() {
        let mut hits = vec![
            Hit::new("docB", "c1", 1),
            Hit::new("docA", "c2", 1),
            Hit::new("docC", "c1", 7),
            Hit::new("docA", "c1", 1),
        ];
        hits.sort_by(Hit::by_rank);
        let order: Vec<(&str, &str)> = hits
            .iter()
            .map(|h| (h.doc_id.as_str(), h.chunk_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("docC", "c1"), ("docA", "c1"), ("docA", "c2"), ("docB", "c1")]
        );
    }

    #[test]
    fn test_answer_single_line_with_and_without_citations() {
        let plain = Answer::new("Cevap.", vec![]);
        assert_eq!(plain.to_single_line(), "Cevap.");

        let cited = Answer::new("Cevap.", vec!["d1:s1:0-10".into(), "d2:s2:5-20".into()]);
        assert_eq!(cited.to_single_line(), "Cevap. See: d1:s1:0-10, d2:s2:5-20");
    }
}
