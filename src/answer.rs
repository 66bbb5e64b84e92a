//! Answer synthesis from the top reranked hit.
//!
//! Two agents share the [`AnswerAgent`] trait. [`TemplateAnswerAgent`] is
//! the default: it picks the best sentence of the top chunk and wraps it in
//! a Turkish source-description template, citing up to the first three
//! resolvable hits. [`SimpleAnswerAgent`] is a leaner baseline that cites
//! the selected sentence's own offset span inside the source document.
//!
//! Sentence selection (template agent): sentences are the chunk text split
//! on runs of `.`, `!`, `?`, trimmed, empties dropped. A sentence
//! containing *all* query terms beats any that does not; then more distinct
//! terms win; then the shorter sentence; then the earlier one. If no
//! sentence contains any term the first sentence is returned, and a chunk
//! with no sentences at all yields a fixed fallback string.

use crate::models::{Answer, Chunk, Hit};
use crate::store::ChunkStore;
use crate::text::lowercase_turkish;
use crate::traits::AnswerAgent;

const NO_ANSWER: &str = "Üzgünüm, sorunuza cevap bulamadım.";
const NO_CHUNK: &str = "Üzgünüm, sorunuza ait detaylı metni bulamadım.";
const NO_INFO: &str = "Bilgi bulunamadı.";

/// Maximum number of citations attached to an answer.
const MAX_CITATIONS: usize = 3;

fn format_citation(chunk: &Chunk) -> String {
    format!(
        "{}:{}:{}-{}",
        chunk.doc_id, chunk.section_id, chunk.start_offset, chunk.end_offset
    )
}

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| lowercase_turkish(t))
        .collect()
}

/// Template-based agent: best sentence plus a source-description preamble.
pub struct TemplateAnswerAgent;

impl TemplateAnswerAgent {
    pub fn new() -> Self {
        Self
    }

    fn select_best_sentence<'a>(text: &'a str, terms_lower: &[String]) -> Option<&'a str> {
        let sentences = split_sentences(text);
        let first = *sentences.first()?;
        if terms_lower.is_empty() {
            return Some(first);
        }

        let mut best = first;
        let mut best_count = 0usize;
        let mut best_all = false;
        let mut best_len = first.chars().count();

        for &sentence in &sentences {
            let lower = lowercase_turkish(sentence);
            let count = terms_lower
                .iter()
                .filter(|t| lower.contains(t.as_str()))
                .count();
            let contains_all = count == terms_lower.len();
            let len = sentence.chars().count();

            let better = match (contains_all, best_all) {
                (true, false) => true,
                (false, true) => false,
                _ => count > best_count || (count == best_count && len < best_len),
            };
            if better {
                best = sentence;
                best_count = count;
                best_all = contains_all;
                best_len = len;
            }
        }

        if best_count == 0 {
            return Some(first);
        }
        Some(best)
    }
}

impl Default for TemplateAnswerAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerAgent for TemplateAnswerAgent {
    fn answer(&self, terms: &[String], hits: &[Hit], store: &ChunkStore) -> Answer {
        let Some(best_hit) = hits.first() else {
            return Answer::new(NO_ANSWER, vec![]);
        };
        let Some(best_chunk) = store.get_chunk(&best_hit.doc_id, &best_hit.chunk_id) else {
            return Answer::new(NO_CHUNK, vec![]);
        };

        let terms_lower = normalize_terms(terms);
        let sentence =
            Self::select_best_sentence(&best_chunk.text, &terms_lower).unwrap_or(NO_INFO);

        let source = match store.get_document_title(&best_chunk.doc_id) {
            Some(title) => format!(
                "Bu cevap \"{title}\" başlıklı belgenin {} bölümünden alınmıştır.",
                best_chunk.section_id
            ),
            None => format!(
                "Bu cevap {} belgesinin {} bölümünden alınmıştır.",
                best_chunk.doc_id, best_chunk.section_id
            ),
        };
        let text = format!("{source} Cevabınız: {sentence}");

        let citations: Vec<String> = hits
            .iter()
            .take(MAX_CITATIONS)
            .filter_map(|hit| store.get_chunk(&hit.doc_id, &hit.chunk_id))
            .map(format_citation)
            .collect();

        Answer::new(text, citations)
    }
}

/// A sentence with its character span inside the chunk text.
struct SentenceSpan<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn split_sentences_with_spans(text: &str) -> Vec<SentenceSpan<'_>> {
    let mut spans = Vec::new();
    let mut seg_start = 0usize; // char index of current segment start
    let mut buf_start_byte = 0usize;
    let mut char_idx = 0usize;

    for (byte_idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            push_span(text, buf_start_byte, byte_idx, seg_start, &mut spans);
            seg_start = char_idx + 1;
            buf_start_byte = byte_idx + ch.len_utf8();
        }
        char_idx += 1;
    }
    push_span(text, buf_start_byte, text.len(), seg_start, &mut spans);
    spans
}

fn push_span<'a>(
    text: &'a str,
    from_byte: usize,
    to_byte: usize,
    seg_start_char: usize,
    spans: &mut Vec<SentenceSpan<'a>>,
) {
    let raw = &text[from_byte..to_byte];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let leading = raw.chars().count() - raw.trim_start().chars().count();
    let start = seg_start_char + leading;
    let end = start + trimmed.chars().count();
    spans.push(SentenceSpan {
        text: trimmed,
        start,
        end,
    });
}

/// Baseline agent: most term-rich sentence, cited by its own offset span.
pub struct SimpleAnswerAgent;

impl SimpleAnswerAgent {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimpleAnswerAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerAgent for SimpleAnswerAgent {
    fn answer(&self, terms: &[String], hits: &[Hit], store: &ChunkStore) -> Answer {
        let Some(top_hit) = hits.first() else {
            return Answer::new(NO_ANSWER, vec![]);
        };
        let Some(chunk) = store.get_chunk(&top_hit.doc_id, &top_hit.chunk_id) else {
            return Answer::new(NO_CHUNK, vec![]);
        };

        let terms_lower = normalize_terms(terms);
        let spans = split_sentences_with_spans(&chunk.text);

        let (sentence, start, end) = match spans.first() {
            None => (NO_INFO.trim_end_matches('.'), 0, 0),
            Some(first) => {
                let mut best = first;
                let mut best_count = 0usize;
                for span in &spans {
                    let lower = lowercase_turkish(span.text);
                    let count = terms_lower
                        .iter()
                        .filter(|t| lower.contains(t.as_str()))
                        .count();
                    if count > best_count {
                        best = span;
                        best_count = count;
                    }
                }
                (best.text, best.start, best.end)
            }
        };

        let citation = format!(
            "{}:{}:{}-{}",
            chunk.doc_id,
            chunk.section_id,
            chunk.start_offset + start as u64,
            chunk.start_offset + end as u64
        );
        let text = format!("Your answer: {sentence}.");

        Answer::new(text, vec![citation])
    }
}
