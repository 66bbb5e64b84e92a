//! Sequential pipeline driver and orchestrator.
//!
//! The pipeline is built once per run from the config: intent rules and
//! stop-words are loaded here, at build time, and injected into the stage
//! implementations, so no stage re-reads a file while executing. `execute`
//! then drives the five stages in order:
//!
//! ```text
//! detectIntent → writeQuery → retrieve → rerank → answer
//! ```
//!
//! Every stage publishes exactly one [`TraceEvent`], carrying an input
//! summary, an output summary, and the elapsed milliseconds. On failure the
//! event is published with its `error` field set (after the error is
//! captured, before it propagates) and the remaining stages are skipped.
//! The pipeline is not transactional.
//!
//! [`run_question`] is the orchestrator: it wires a [`TraceBus`] with the
//! per-run JSONL sink, builds the pipeline, executes it against a fresh
//! [`Context`], and returns the context to the caller. The trace sink's
//! lifetime is bounded by that call.

use std::time::Instant;

use crate::answer::{SimpleAnswerAgent, TemplateAnswerAgent};
use crate::config::{
    AnswerAgentKind, Config, IntentDetectorKind, QueryWriterKind, RerankerKind, RetrieverKind,
};
use crate::context::Context;
use crate::error::Result;
use crate::intent::{IntentRules, RuleIntentDetector};
use crate::models::Query;
use crate::rerank::SimpleReranker;
use crate::retrieve::KeywordRetriever;
use crate::store::ChunkStore;
use crate::trace::{JsonlTraceSink, TraceBus, TraceEvent};
use crate::traits::{AnswerAgent, IntentDetector, QueryWriter, Reranker, Retriever};
use crate::writer::{load_stopwords, HeuristicQueryWriter};

pub struct SequentialPipeline {
    detector: Box<dyn IntentDetector>,
    writer: Box<dyn QueryWriter>,
    retriever: Box<dyn Retriever>,
    reranker: Box<dyn Reranker>,
    agent: Box<dyn AnswerAgent>,
    rules: IntentRules,
    stopword_count: usize,
}

impl std::fmt::Debug for SequentialPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialPipeline")
            .field("stopword_count", &self.stopword_count)
            .finish_non_exhaustive()
    }
}

impl SequentialPipeline {
    /// Build the configured stage implementations, loading the rules and
    /// stop-words files once.
    pub fn from_config(config: &Config) -> Result<Self> {
        let rules = IntentRules::load(&config.rules_file)?;
        let stopwords = load_stopwords(&config.stopwords_file)?;
        let stopword_count = stopwords.len();

        let detector: Box<dyn IntentDetector> = match config.pipeline.intent_detector {
            IntentDetectorKind::Rule => Box::new(RuleIntentDetector::new(rules.clone())),
        };
        let writer: Box<dyn QueryWriter> = match config.pipeline.query_writer {
            QueryWriterKind::Heuristic => {
                Box::new(HeuristicQueryWriter::new(stopwords, rules.booster_map()))
            }
        };
        let retriever: Box<dyn Retriever> = match config.pipeline.retriever {
            RetrieverKind::Keyword => Box::new(KeywordRetriever::new(config.top_k)),
        };
        let reranker: Box<dyn Reranker> = match config.pipeline.reranker {
            RerankerKind::Simple => Box::new(SimpleReranker::new(
                config.reranker.proximity_window,
                config.reranker.proximity_bonus,
                config.reranker.title_boost,
            )),
        };
        let agent: Box<dyn AnswerAgent> = match config.pipeline.answer_agent {
            AnswerAgentKind::Template => Box::new(TemplateAnswerAgent::new()),
            AnswerAgentKind::Simple => Box::new(SimpleAnswerAgent::new()),
        };

        Ok(Self {
            detector,
            writer,
            retriever,
            reranker,
            agent,
            rules,
            stopword_count,
        })
    }

    /// Run the five stages in order, aborting on the first failure.
    pub fn execute(&self, ctx: &mut Context, bus: &mut TraceBus) -> Result<()> {
        self.detect_intent(ctx, bus)?;
        self.write_query(ctx, bus)?;
        self.retrieve(ctx, bus)?;
        self.rerank(ctx, bus)?;
        self.answer(ctx, bus)?;
        Ok(())
    }

    fn detect_intent(&self, ctx: &mut Context, bus: &mut TraceBus) -> Result<()> {
        let inputs = format!("question=\"{}\"", ctx.question.text());
        run_stage(bus, "detectIntent", inputs, || {
            let intent = self.detector.detect(ctx.question.text());
            ctx.intent = Some(intent);
            ctx.intent_rules = Some(self.rules.clone());
            Ok(format!("intent={intent}"))
        })
    }

    fn write_query(&self, ctx: &mut Context, bus: &mut TraceBus) -> Result<()> {
        let inputs = format!("stopwords={}", self.stopword_count);
        run_stage(bus, "writeQuery", inputs, || {
            let intent = ctx.intent.unwrap_or(crate::models::Intent::Unknown);
            let terms = self.writer.write(ctx.question.text(), intent);
            let summary = format!("terms={} [{}]", terms.len(), terms.join(", "));
            ctx.terms = Some(terms);
            Ok(summary)
        })
    }

    fn retrieve(&self, ctx: &mut Context, bus: &mut TraceBus) -> Result<()> {
        let terms = ctx.terms.clone().unwrap_or_default();
        let inputs = format!("terms={}", terms.len());
        run_stage(bus, "retrieve", inputs, || {
            let hits = self.retriever.retrieve(&terms, &ctx.store);
            let summary = format!("hits={} {}", hits.len(), summarize_hits(&hits));
            ctx.retrieved_hits = Some(hits);
            Ok(summary)
        })
    }

    fn rerank(&self, ctx: &mut Context, bus: &mut TraceBus) -> Result<()> {
        let terms = ctx.terms.clone().unwrap_or_default();
        let hits = ctx.retrieved_hits.clone().unwrap_or_default();
        let inputs = format!("hits={}", hits.len());
        run_stage(bus, "rerank", inputs, || {
            let reranked = self.reranker.rerank(&terms, &hits, &ctx.store);
            let summary = format!("hits={} {}", reranked.len(), summarize_hits(&reranked));
            ctx.reranked_hits = Some(reranked);
            Ok(summary)
        })
    }

    fn answer(&self, ctx: &mut Context, bus: &mut TraceBus) -> Result<()> {
        let terms = ctx.terms.clone().unwrap_or_default();
        let hits = ctx.reranked_hits.clone().unwrap_or_default();
        let inputs = format!("hits={}", hits.len());
        run_stage(bus, "answer", inputs, || {
            let answer = self.agent.answer(&terms, &hits, &ctx.store);
            let summary = format!("citations={}", answer.citations.len());
            ctx.final_answer = Some(answer);
            Ok(summary)
        })
    }
}

fn summarize_hits(hits: &[crate::models::Hit]) -> String {
    let rendered: Vec<String> = hits.iter().map(|h| h.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

/// Time a stage body, publish its trace event, and propagate its result.
///
/// The event is published whether or not the stage succeeds; on failure the
/// error message is captured into the event before the error propagates.
fn run_stage<F>(bus: &mut TraceBus, stage: &str, inputs: String, body: F) -> Result<()>
where
    F: FnOnce() -> Result<String>,
{
    let started = Instant::now();
    let result = body();
    let timing_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(outputs_summary) => {
            bus.publish(&TraceEvent::new(stage, inputs, outputs_summary, timing_ms, None))?;
            Ok(())
        }
        Err(err) => {
            let event = TraceEvent::new(stage, inputs, "", timing_ms, Some(err.to_string()));
            bus.publish(&event)?;
            Err(err)
        }
    }
}

/// Orchestrate one question end to end and return the populated context.
pub fn run_question(config: &Config, question: &str, store: ChunkStore) -> Result<Context> {
    // Build the pipeline first: configuration errors must surface before
    // any trace file is created.
    let pipeline = SequentialPipeline::from_config(config)?;

    let mut bus = TraceBus::new();
    bus.register(Box::new(JsonlTraceSink::new(&config.logs_dir)?));

    let mut ctx = Context::new(Query::new(question), store);
    pipeline.execute(&mut ctx, &mut bus)?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RerankerParams, StageSelection};
    use crate::error::Error;
    use crate::models::Chunk;
    use crate::trace::TraceSink;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct CollectingSink {
        events: Rc<RefCell<Vec<TraceEvent>>>,
    }

    impl TraceSink for CollectingSink {
        fn record(&mut self, event: &TraceEvent) -> Result<()> {
            self.events.borrow_mut().push(event.clone());
            Ok(())
        }
    }

    fn fixture_config(tmp: &TempDir, answer_agent: AnswerAgentKind) -> Config {
        fs::write(
            tmp.path().join("rules.yaml"),
            r#"
intent_priority:
  - registration
  - staff_lookup
keyword_rules:
  registration:
    - "kayıt"
  staff_lookup:
    - "danışman"
"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("stopwords.yaml"),
            "stop_words:\n  - \"ve\"\n  - \"için\"\n",
        )
        .unwrap();

        Config {
            pipeline: StageSelection {
                intent_detector: IntentDetectorKind::Rule,
                query_writer: QueryWriterKind::Heuristic,
                retriever: RetrieverKind::Keyword,
                reranker: RerankerKind::Simple,
                answer_agent,
            },
            rules_file: tmp.path().join("rules.yaml"),
            stopwords_file: tmp.path().join("stopwords.yaml"),
            top_k: 10,
            top_n: 20,
            reranker: RerankerParams::default(),
            chunk_store: tmp.path().join("chunks.json"),
            logs_dir: tmp.path().join("logs"),
        }
    }

    fn demo_store() -> ChunkStore {
        let mut store = ChunkStore::new();
        store.add_chunk(Chunk {
            doc_id: "kayit".into(),
            chunk_id: "c1".into(),
            section_id: "genel".into(),
            text: "Kayıt formu öğrenci işlerinden alınır. Kayıt için danışman onayı gerekir."
                .into(),
            start_offset: 0,
            end_offset: 73,
        });
        store.add_chunk(Chunk {
            doc_id: "yemek".into(),
            chunk_id: "c1".into(),
            section_id: "menu".into(),
            text: "Yemekhane menüsü her hafta yenilenir.".into(),
            start_offset: 0,
            end_offset: 37,
        });
        store.set_document_title("kayit", "Öğrenci Kayıt Kılavuzu");
        store
    }

    #[test]
    fn test_execute_publishes_one_event_per_stage_in_order() {
        let tmp = TempDir::new().unwrap();
        let config = fixture_config(&tmp, AnswerAgentKind::Template);
        let pipeline = SequentialPipeline::from_config(&config).unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let mut bus = TraceBus::new();
        bus.register(Box::new(CollectingSink { events: events.clone() }));

        let mut ctx = Context::new(Query::new("Kayıt nasıl yapılır?"), demo_store());
        pipeline.execute(&mut ctx, &mut bus).unwrap();

        let stages: Vec<String> = events.borrow().iter().map(|e| e.stage.clone()).collect();
        assert_eq!(
            stages,
            vec!["detectIntent", "writeQuery", "retrieve", "rerank", "answer"]
        );
        assert!(events.borrow().iter().all(|e| !e.has_error()));
    }

    #[test]
    fn test_execute_populates_every_context_field() {
        let tmp = TempDir::new().unwrap();
        let config = fixture_config(&tmp, AnswerAgentKind::Template);
        let pipeline = SequentialPipeline::from_config(&config).unwrap();

        let mut bus = TraceBus::new();
        let mut ctx = Context::new(Query::new("Kayıt için danışman onayı gerekli mi?"), demo_store());
        pipeline.execute(&mut ctx, &mut bus).unwrap();

        assert_eq!(ctx.intent, Some(crate::models::Intent::Registration));
        assert!(ctx.intent_rules.is_some());
        let terms = ctx.terms.as_ref().unwrap();
        assert!(terms.contains(&"kayıt".to_string()));
        assert!(!terms.contains(&"için".to_string()));
        assert!(!ctx.retrieved_hits.as_ref().unwrap().is_empty());
        assert!(!ctx.reranked_hits.as_ref().unwrap().is_empty());

        let answer = ctx.final_answer.as_ref().unwrap();
        assert!(answer
            .text
            .starts_with("Bu cevap \"Öğrenci Kayıt Kılavuzu\" başlıklı belgenin genel bölümünden"));
        assert_eq!(answer.citations, vec!["kayit:genel:0-73"]);
    }

    #[test]
    fn test_reranked_scores_are_rescaled_retriever_scores() {
        let tmp = TempDir::new().unwrap();
        let config = fixture_config(&tmp, AnswerAgentKind::Template);
        let pipeline = SequentialPipeline::from_config(&config).unwrap();

        let mut bus = TraceBus::new();
        let mut ctx = Context::new(Query::new("Kayıt formu nereden alınır?"), demo_store());
        pipeline.execute(&mut ctx, &mut bus).unwrap();

        let retrieved = ctx.retrieved_hits.as_ref().unwrap();
        let reranked = ctx.reranked_hits.as_ref().unwrap();
        for hit in reranked {
            let base = retrieved
                .iter()
                .find(|r| r.doc_id == hit.doc_id && r.chunk_id == hit.chunk_id)
                .unwrap();
            let delta = hit.score - base.score * 10;
            assert!(
                [0, 5, 3, 8].contains(&delta),
                "unexpected rerank delta {delta} for {hit}"
            );
        }
    }

    #[test]
    fn test_simple_agent_selected_by_config() {
        let tmp = TempDir::new().unwrap();
        let config = fixture_config(&tmp, AnswerAgentKind::Simple);
        let pipeline = SequentialPipeline::from_config(&config).unwrap();

        let mut bus = TraceBus::new();
        let mut ctx = Context::new(Query::new("Kayıt formu nereden alınır?"), demo_store());
        pipeline.execute(&mut ctx, &mut bus).unwrap();

        let answer = ctx.final_answer.as_ref().unwrap();
        assert!(answer.text.starts_with("Your answer: "));
        assert_eq!(answer.citations.len(), 1);
    }

    #[test]
    fn test_missing_rules_file_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let mut config = fixture_config(&tmp, AnswerAgentKind::Template);
        config.rules_file = tmp.path().join("absent.yaml");
        let err = SequentialPipeline::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_run_question_writes_trace_file() {
        let tmp = TempDir::new().unwrap();
        let config = fixture_config(&tmp, AnswerAgentKind::Template);

        let ctx = run_question(&config, "Kayıt nasıl yapılır?", demo_store()).unwrap();
        assert!(ctx.final_answer.is_some());

        let entries: Vec<_> = fs::read_dir(&config.logs_dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        let content = fs::read_to_string(&entries[0]).unwrap();
        assert_eq!(content.lines().count(), 5);
        for line in content.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("error").is_none());
        }
    }

    #[test]
    fn test_unmatched_question_still_answers_with_apology() {
        let tmp = TempDir::new().unwrap();
        let config = fixture_config(&tmp, AnswerAgentKind::Template);
        let pipeline = SequentialPipeline::from_config(&config).unwrap();

        let mut bus = TraceBus::new();
        let mut ctx = Context::new(Query::new("uzay istasyonu nerede"), demo_store());
        pipeline.execute(&mut ctx, &mut bus).unwrap();

        assert_eq!(ctx.intent, Some(crate::models::Intent::Unknown));
        assert_eq!(
            ctx.final_answer.as_ref().unwrap().text,
            "Üzgünüm, sorunuza cevap bulamadım."
        );
    }
}
