//! Configuration loading.
//!
//! The config file is YAML with three sections: `pipeline` selects one
//! implementation per stage, `params` carries stage parameters, and
//! `paths` points at the chunk file and the logs directory. Stage
//! discriminator strings are mapped onto closed enums here, at load time,
//! so an unrecognised implementation name fails before any pipeline work
//! starts. Relative paths resolve against the config file's parent
//! directory; a leading `./` is stripped and `../` traverses upward.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::rerank::{DEFAULT_PROXIMITY_BONUS, DEFAULT_PROXIMITY_WINDOW, DEFAULT_TITLE_BOOST};

/// Intent detector implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentDetectorKind {
    Rule,
}

/// Query writer implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWriterKind {
    Heuristic,
}

/// Retriever implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieverKind {
    Keyword,
}

/// Reranker implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerankerKind {
    Simple,
}

/// Answer agent implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerAgentKind {
    Template,
    Simple,
}

impl IntentDetectorKind {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "RuleIntentDetector" => Ok(Self::Rule),
            other => Err(Error::PipelineConfig(format!("intent detector {other:?}"))),
        }
    }
}

impl QueryWriterKind {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "HeuristicQueryWriter" => Ok(Self::Heuristic),
            other => Err(Error::PipelineConfig(format!("query writer {other:?}"))),
        }
    }
}

impl RetrieverKind {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "KeywordRetriever" => Ok(Self::Keyword),
            other => Err(Error::PipelineConfig(format!("retriever {other:?}"))),
        }
    }
}

impl RerankerKind {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "SimpleReranker" => Ok(Self::Simple),
            other => Err(Error::PipelineConfig(format!("reranker {other:?}"))),
        }
    }
}

impl AnswerAgentKind {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "TemplateAnswerAgent" => Ok(Self::Template),
            "SimpleAnswerAgent" => Ok(Self::Simple),
            other => Err(Error::PipelineConfig(format!("answer agent {other:?}"))),
        }
    }
}

/// One implementation choice per pipeline stage.
#[derive(Debug, Clone)]
pub struct StageSelection {
    pub intent_detector: IntentDetectorKind,
    pub query_writer: QueryWriterKind,
    pub retriever: RetrieverKind,
    pub reranker: RerankerKind,
    pub answer_agent: AnswerAgentKind,
}

/// Reranker tuning parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RerankerParams {
    #[serde(default = "default_proximity_window")]
    pub proximity_window: usize,
    #[serde(default = "default_proximity_bonus")]
    pub proximity_bonus: i64,
    #[serde(default = "default_title_boost")]
    pub title_boost: i64,
}

fn default_proximity_window() -> usize {
    DEFAULT_PROXIMITY_WINDOW
}
fn default_proximity_bonus() -> i64 {
    DEFAULT_PROXIMITY_BONUS
}
fn default_title_boost() -> i64 {
    DEFAULT_TITLE_BOOST
}

impl Default for RerankerParams {
    fn default() -> Self {
        Self {
            proximity_window: default_proximity_window(),
            proximity_bonus: default_proximity_bonus(),
            title_boost: default_title_boost(),
        }
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub pipeline: StageSelection,
    pub rules_file: PathBuf,
    pub stopwords_file: PathBuf,
    pub top_k: usize,
    pub top_n: usize,
    pub reranker: RerankerParams,
    pub chunk_store: PathBuf,
    pub logs_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    pipeline: RawPipeline,
    params: RawParams,
    paths: RawPaths,
}

#[derive(Debug, Deserialize)]
struct RawPipeline {
    intent_detector: String,
    query_writer: String,
    retriever: String,
    reranker: String,
    answer_agent: String,
}

#[derive(Debug, Deserialize)]
struct RawParams {
    intent: RawIntentParams,
    retriever: RawRetrieverParams,
    query_writer: RawWriterParams,
    #[serde(default)]
    reranker: Option<RerankerParams>,
}

#[derive(Debug, Deserialize)]
struct RawIntentParams {
    rules_file: String,
}

#[derive(Debug, Deserialize)]
struct RawRetrieverParams {
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct RawWriterParams {
    stopwords_file: String,
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RawPaths {
    chunk_store: String,
    logs_dir: String,
}

/// Resolve a config-file path value against the config's parent directory.
fn resolve_path(base: &Path, raw: &str) -> PathBuf {
    let raw_path = Path::new(raw);
    if raw_path.is_absolute() {
        return raw_path.to_path_buf();
    }

    let mut raw = raw;
    if let Some(stripped) = raw.strip_prefix("./") {
        raw = stripped;
    }
    let mut resolved = base.to_path_buf();
    while let Some(stripped) = raw.strip_prefix("../") {
        resolved.pop();
        raw = stripped;
    }
    resolved.join(raw)
}

/// Load, resolve, and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read config file {}: {e}", path.display())))?;
    let raw: RawConfig = serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse config file {}: {e}", path.display())))?;

    let pipeline = StageSelection {
        intent_detector: IntentDetectorKind::parse(&raw.pipeline.intent_detector)?,
        query_writer: QueryWriterKind::parse(&raw.pipeline.query_writer)?,
        retriever: RetrieverKind::parse(&raw.pipeline.retriever)?,
        reranker: RerankerKind::parse(&raw.pipeline.reranker)?,
        answer_agent: AnswerAgentKind::parse(&raw.pipeline.answer_agent)?,
    };

    if raw.params.retriever.top_k == 0 {
        return Err(Error::Config("params.retriever.top_k must be >= 1".into()));
    }
    if raw.params.query_writer.top_n == 0 {
        return Err(Error::Config("params.query_writer.top_n must be >= 1".into()));
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));

    Ok(Config {
        pipeline,
        rules_file: resolve_path(base, &raw.params.intent.rules_file),
        stopwords_file: resolve_path(base, &raw.params.query_writer.stopwords_file),
        top_k: raw.params.retriever.top_k,
        top_n: raw.params.query_writer.top_n,
        reranker: raw.params.reranker.unwrap_or_default(),
        chunk_store: resolve_path(base, &raw.paths.chunk_store),
        logs_dir: resolve_path(base, &raw.paths.logs_dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
pipeline:
  intent_detector: "RuleIntentDetector"
  query_writer: "HeuristicQueryWriter"
  retriever: "KeywordRetriever"
  reranker: "SimpleReranker"
  answer_agent: "TemplateAnswerAgent"
params:
  intent:
    rules_file: "./rules.yaml"
  retriever:
    top_k: 10
  query_writer:
    stopwords_file: "./stopwords.yaml"
    top_n: 20
paths:
  chunk_store: "./chunks.json"
  logs_dir: "./logs"
"#;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rag.yaml");
        fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_load_full_config() {
        let (tmp, path) = write_config(FULL_CONFIG);
        let config = load_config(&path).unwrap();

        assert_eq!(config.pipeline.intent_detector, IntentDetectorKind::Rule);
        assert_eq!(config.pipeline.answer_agent, AnswerAgentKind::Template);
        assert_eq!(config.top_k, 10);
        assert_eq!(config.top_n, 20);
        assert_eq!(config.rules_file, tmp.path().join("rules.yaml"));
        assert_eq!(config.chunk_store, tmp.path().join("chunks.json"));
        assert_eq!(config.logs_dir, tmp.path().join("logs"));
        // Reranker section omitted: defaults apply.
        assert_eq!(config.reranker.proximity_window, 15);
        assert_eq!(config.reranker.proximity_bonus, 5);
        assert_eq!(config.reranker.title_boost, 3);
    }

    #[test]
    fn test_unknown_stage_discriminator_fails_at_load() {
        let broken = FULL_CONFIG.replace("KeywordRetriever", "NeuralRetriever");
        let (_tmp, path) = write_config(&broken);
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, Error::PipelineConfig(_)));
        assert!(err.to_string().contains("NeuralRetriever"));
    }

    #[test]
    fn test_simple_answer_agent_is_accepted() {
        let alt = FULL_CONFIG.replace("TemplateAnswerAgent", "SimpleAnswerAgent");
        let (_tmp, path) = write_config(&alt);
        let config = load_config(&path).unwrap();
        assert_eq!(config.pipeline.answer_agent, AnswerAgentKind::Simple);
    }

    #[test]
    fn test_parent_traversal_in_paths() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("conf");
        fs::create_dir_all(&nested).unwrap();
        let path = nested.join("rag.yaml");
        fs::write(&path, FULL_CONFIG.replace("./chunks.json", "../data/chunks.json")).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.chunk_store, tmp.path().join("data/chunks.json"));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let broken = FULL_CONFIG.replace("top_k: 10", "top_k: 0");
        let (_tmp, path) = write_config(&broken);
        assert!(matches!(load_config(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_and_missing_key() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("absent.yaml")).is_err());

        let (_tmp2, path) = write_config("pipeline:\n  intent_detector: \"RuleIntentDetector\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_reranker_params_override() {
        let with_reranker = FULL_CONFIG.replace(
            "  retriever:\n    top_k: 10",
            "  retriever:\n    top_k: 10\n  reranker:\n    proximity_window: 30\n    proximity_bonus: 7\n    title_boost: 2",
        );
        let (_tmp, path) = write_config(&with_reranker);
        let config = load_config(&path).unwrap();
        assert_eq!(config.reranker.proximity_window, 30);
        assert_eq!(config.reranker.proximity_bonus, 7);
        assert_eq!(config.reranker.title_boost, 2);
    }
}
