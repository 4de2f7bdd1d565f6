use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
    Warning,
    Info,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Error => "error",
            StepStatus::Warning => "warning",
            StepStatus::Info => "info",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    pub step: String,
    pub status: StepStatus,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only diagnostic trail of a run.
///
/// Read for display only; nothing in the pipeline branches on its content.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepLog {
    entries: Vec<StepEntry>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: impl Into<String>, status: StepStatus, details: impl Into<String>) {
        let entry = StepEntry {
            step: step.into(),
            status,
            details: details.into(),
            timestamp: Utc::now(),
        };
        tracing::trace!("[{}] {}: {}", entry.status, entry.step, entry.details);
        self.entries.push(entry);
    }

    pub fn success(&mut self, step: impl Into<String>, details: impl Into<String>) {
        self.record(step, StepStatus::Success, details);
    }

    pub fn error(&mut self, step: impl Into<String>, details: impl Into<String>) {
        self.record(step, StepStatus::Error, details);
    }

    pub fn warning(&mut self, step: impl Into<String>, details: impl Into<String>) {
        self.record(step, StepStatus::Warning, details);
    }

    pub fn info(&mut self, step: impl Into<String>, details: impl Into<String>) {
        self.record(step, StepStatus::Info, details);
    }

    pub fn entries(&self) -> &[StepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}
