//! Emitter trait and the data every emitter works from

use crate::config::{GeneratorConfig, TargetLanguage};
use crate::error::{CodegenError, Result};
use crate::java::JavaEmitter;
use crate::json::JsonEmitter;
use crate::rust::RustEmitter;
use crate::verify::{ProbeOutput, VerificationReport};
use constgen::{ConstantRecord, HexLiteral};
use serde::{Deserialize, Serialize};

/// Leading comment block of one input header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderCopyright {
    /// Header name as given on input
    pub file_name: String,
    /// Collected comment lines, ending with a blank line
    pub text: String,
}

impl HeaderCopyright {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
        }
    }
}

/// Everything an emitter needs for one output file
#[derive(Debug, Clone, Copy)]
pub struct GenerationUnit<'a> {
    /// Resolved records in output order
    pub records: &'a [ConstantRecord],
    /// Copyright blocks in input order
    pub headers: &'a [HeaderCopyright],
    /// Probe output from system verification, if it ran
    pub report: Option<&'a VerificationReport>,
    /// Emit per-constant debugging detail
    pub verbose: bool,
}

impl<'a> GenerationUnit<'a> {
    pub fn new(records: &'a [ConstantRecord], headers: &'a [HeaderCopyright]) -> Self {
        Self {
            records,
            headers,
            report: None,
            verbose: false,
        }
    }

    pub fn with_report(mut self, report: Option<&'a VerificationReport>) -> Self {
        self.report = report;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Probe output for a record, only when verbose output is requested
    pub fn probe_output(&self, name: &str) -> Option<&'a ProbeOutput> {
        if !self.verbose {
            return None;
        }
        self.report.and_then(|report| report.get(name))
    }
}

/// Formats resolved constants as source text of a target language.
///
/// Emitters never mutate records and refuse records without a value.
pub trait ConstantEmitter: Send + Sync {
    /// Language this emitter produces
    fn target(&self) -> TargetLanguage;

    /// Render the complete output file
    fn emit(&self, unit: &GenerationUnit<'_>) -> Result<String>;
}

/// Value of a record, or an error naming it
pub fn require_resolved(record: &ConstantRecord) -> Result<HexLiteral> {
    record
        .resolved_value()
        .ok_or_else(|| CodegenError::UnresolvedRecord {
            name: record.name.clone(),
        })
}

/// Emitter for the configured target
pub fn emitter_for(config: &GeneratorConfig) -> Box<dyn ConstantEmitter> {
    match config.target {
        TargetLanguage::Java => Box::new(JavaEmitter::new(&config.java_package, &config.type_name)),
        TargetLanguage::Rust => Box::new(RustEmitter::new()),
        TargetLanguage::Json => Box::new(JsonEmitter::new()),
    }
}

/// Lines of captured tool output as they appear in generated comments:
/// each line trimmed, prefixed, and stripped of trailing whitespace.
pub(crate) fn comment_block(prefix: &str, text: &str) -> String {
    let mut out = String::new();
    for line in text.split('\n') {
        let commented = format!("{prefix}{}", line.trim());
        out.push_str(commented.trim_end());
        out.push('\n');
    }
    out
}
