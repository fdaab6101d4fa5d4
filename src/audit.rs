// ABOUTME: Append-only JSONL audit sink — one atomic line per invocation.
// ABOUTME: The record aggregates the request, every stage output, and the exact response.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gate::pipeline::{Evaluation, GateOutcome};
use crate::gate::types::{
    Explanation, HookKind, Mode, PreferenceVerdict, Resolution, TriageResult,
};
use crate::request::ActionRequest;

/// Everything about one invocation, owned by the sink and never read back by
/// the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub argv: Vec<String>,
    pub raw_stdin: String,
    pub cwd: PathBuf,
    pub hook_kind: HookKind,
    pub tool_name: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triage: Option<TriageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<PreferenceVerdict>,
    /// Absent for passthrough tools, which never get a resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    /// The exact line emitted on stdout.
    pub response: serde_json::Value,
}

impl AuditRecord {
    /// Assemble the record for one finished invocation.
    pub fn new(req: &ActionRequest, evaluation: &Evaluation, response: serde_json::Value) -> Self {
        let resolution = match &evaluation.outcome {
            GateOutcome::Passthrough => None,
            GateOutcome::Decided(r) => Some(r.clone()),
        };
        Self {
            timestamp: Utc::now(),
            argv: req.argv.clone(),
            raw_stdin: req.raw_stdin.clone(),
            cwd: req.cwd.clone(),
            hook_kind: req.hook_kind,
            tool_name: req.tool_name.clone(),
            mode: req.mode,
            triage: evaluation.triage.clone(),
            explanation: evaluation.explanation.clone(),
            preference: evaluation.preference.clone(),
            resolution,
            response,
        }
    }
}

/// Appends records to a JSONL log file.
///
/// The record is serialized first and written with a single append, so many
/// concurrent hook processes never interleave partial lines.
pub struct AuditSink {
    path: PathBuf,
}

impl AuditSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Creates parent directories as needed.
    pub fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
