//! Stage tracing: event fan-out and the JSONL file sink.
//!
//! Every stage publishes exactly one [`TraceEvent`] per attempt, success or
//! failure. The [`TraceBus`] forwards events to its sinks synchronously, in
//! registration order; event order is the sole observable record of
//! pipeline progress. The file sink appends one JSON object per line to a
//! per-run file named after the sink's construction time.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// A structured record of one pipeline stage execution.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub stage: String,
    pub inputs: String,
    #[serde(rename = "outputsSummary")]
    pub outputs_summary: String,
    #[serde(rename = "timingMs")]
    pub timing_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceEvent {
    pub fn new(
        stage: impl Into<String>,
        inputs: impl Into<String>,
        outputs_summary: impl Into<String>,
        timing_ms: u64,
        error: Option<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            inputs: inputs.into(),
            outputs_summary: outputs_summary.into(),
            timing_ms,
            error,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Receives trace events, one call per event.
pub trait TraceSink {
    fn record(&mut self, event: &TraceEvent) -> Result<()>;
}

/// Fans events out to every registered sink in registration order.
#[derive(Default)]
pub struct TraceBus {
    sinks: Vec<Box<dyn TraceSink>>,
}

impl TraceBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sink: Box<dyn TraceSink>) {
        self.sinks.push(sink);
    }

    pub fn publish(&mut self, event: &TraceEvent) -> Result<()> {
        for sink in &mut self.sinks {
            sink.record(event)?;
        }
        Ok(())
    }
}

/// Writes one JSON record per event to `<logs_dir>/run-<timestamp>.jsonl`.
pub struct JsonlTraceSink {
    log_file: PathBuf,
    file: File,
}

impl JsonlTraceSink {
    /// Create the logs directory if needed and open this run's file.
    pub fn new(logs_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(logs_dir).map_err(|e| {
            Error::Config(format!(
                "failed to create logs directory {}: {e}",
                logs_dir.display()
            ))
        })?;
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let log_file = logs_dir.join(format!("run-{timestamp}.jsonl"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| {
                Error::Config(format!("failed to open trace file {}: {e}", log_file.display()))
            })?;
        Ok(Self { log_file, file })
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

impl TraceSink for JsonlTraceSink {
    fn record(&mut self, event: &TraceEvent) -> Result<()> {
        let line = serde_json::to_string(event).map_err(|e| Error::Stage {
            stage: event.stage.clone(),
            message: format!("failed to serialize trace event: {e}"),
        })?;
        writeln!(self.file, "{line}").map_err(|e| Error::Stage {
            stage: event.stage.clone(),
            message: format!("failed to write trace event to {}: {e}", self.log_file.display()),
        })
    }
}
