use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unparseable config, rules, stop-words, or chunk file,
    /// a missing required key, or an unknown intent name.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A stage discriminator in the config that maps to no known
    /// implementation.
    #[error("unknown pipeline implementation: {0}")]
    PipelineConfig(String),

    /// A runtime failure inside a pipeline stage.
    #[error("stage {stage} failed: {message}")]
    Stage { stage: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
