use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory where run directories are created.
    pub out_dir: PathBuf,
    /// Write one CSV per record kind next to `bundle.json`.
    pub write_csv: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("runs"),
            write_csv: true,
        }
    }
}

/// Structured generation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    pub path: Option<String>,
}

impl GenerationIssue {
    pub fn warning(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub content_version: String,
    pub seed: u64,
    pub records: BTreeMap<String, u64>,
    pub questions_by_type: BTreeMap<String, u64>,
    pub series_expanded: u64,
    pub generated_questions: u64,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            content_version: lessonforge_core::CONTENT_VERSION.to_string(),
            seed: 0,
            records: BTreeMap::new(),
            questions_by_type: BTreeMap::new(),
            series_expanded: 0,
            generated_questions: 0,
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
            bytes_written: 0,
            duration_ms: 0,
        }
    }

    pub fn record_count(&mut self, kind: &str, count: u64) {
        *self.records.entry(kind.to_string()).or_insert(0) += count;
    }

    pub fn record_question_type(&mut self, question_type: &str) {
        *self
            .questions_by_type
            .entry(question_type.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }
}
