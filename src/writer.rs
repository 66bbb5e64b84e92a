//! Heuristic query rewriting.
//!
//! The writer turns the raw question into an ordered, deduplicated term
//! list: Turkish lowercasing, punctuation stripping, whitespace split,
//! stop-word filtering, then intent boosters appended last. Stop-words and
//! boosters are lowercased once at construction so the per-question path
//! does no repeated normalisation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::Intent;
use crate::text::lowercase_turkish;
use crate::traits::QueryWriter;

#[derive(Debug, Deserialize)]
struct StopwordsFile {
    #[serde(default)]
    stop_words: Vec<String>,
}

/// Load the stop-words file at `path` into a set.
pub fn load_stopwords(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read stop-words file {}: {e}", path.display()))
    })?;
    let file: StopwordsFile = serde_yaml::from_str(&content).map_err(|e| {
        Error::Config(format!("failed to parse stop-words file {}: {e}", path.display()))
    })?;
    Ok(file.stop_words.into_iter().collect())
}

pub struct HeuristicQueryWriter {
    stopwords: HashSet<String>,
    boosters: HashMap<Intent, Vec<String>>,
}

impl HeuristicQueryWriter {
    /// Build a writer, lowercasing stop-words and boosters up front and
    /// dropping blank entries.
    pub fn new(stopwords: HashSet<String>, boosters: HashMap<Intent, Vec<String>>) -> Self {
        let stopwords = stopwords
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| lowercase_turkish(&s))
            .collect();
        let boosters = boosters
            .into_iter()
            .map(|(intent, words)| {
                let words = words
                    .into_iter()
                    .filter(|w| !w.trim().is_empty())
                    .map(|w| lowercase_turkish(&w))
                    .collect();
                (intent, words)
            })
            .collect();
        Self { stopwords, boosters }
    }
}

impl QueryWriter for HeuristicQueryWriter {
    fn write(&self, question: &str, intent: Intent) -> Vec<String> {
        if question.trim().is_empty() {
            return Vec::new();
        }

        // Lowercase, then blank out everything that is not a letter or digit
        // so Turkish letters survive while punctuation splits tokens.
        let lower = lowercase_turkish(question);
        let cleaned: String = lower
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut terms: Vec<String> = Vec::new();
        for token in cleaned.split_whitespace() {
            if self.stopwords.contains(token) {
                continue;
            }
            if seen.insert(token) {
                terms.push(token.to_string());
            }
        }

        if let Some(boosters) = self.boosters.get(&intent) {
            for booster in boosters {
                if !terms.iter().any(|t| t == booster) {
                    terms.push(booster.clone());
                }
            }
        }

        terms
    }
}
