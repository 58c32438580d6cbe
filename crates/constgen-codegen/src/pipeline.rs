//! Generation pipeline
//!
//! ```text
//! parse each header → merge in input order → filter → resolve
//!     → verify (optional) → emit → compile check (optional)
//! ```
//!
//! Every stage is fail-fast: the first error aborts the run and no output
//! text is produced.

use crate::check::compile_check;
use crate::config::{GeneratorConfig, TargetLanguage};
use crate::emitter::{emitter_for, GenerationUnit, HeaderCopyright};
use crate::error::{CodegenError, Result};
use crate::verify::{VerificationReport, Verifier};
use constgen::{parse_header, ConstantSet, PrefixFilter, Resolver};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One input header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSource {
    /// Name recorded as the source file of its constants
    pub file_name: String,
    pub contents: String,
}

impl HeaderSource {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    /// Read a header, naming it by the path as given
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| CodegenError::io(path, source))?;
        Ok(Self::new(path.display().to_string(), contents))
    }
}

/// Counters for one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub headers: usize,
    /// `#define` statements found
    pub definitions: usize,
    /// Constants emitted
    pub constants: usize,
    /// Definitions dropped by the prefix allowlist
    pub ignored: usize,
    /// Definitions replaced by a later one with the same name
    pub superseded: usize,
    pub substitutions: usize,
    pub max_passes: usize,
    /// Constants confirmed against system headers
    pub verified: usize,
}

/// Resolved constants with the copyright blocks of their headers
#[derive(Debug, Clone)]
pub struct ResolvedConstants {
    pub constants: ConstantSet,
    pub headers: Vec<HeaderCopyright>,
    pub stats: GenerationStats,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// Complete generated file
    pub text: String,
    pub target: TargetLanguage,
    pub constants: ConstantSet,
    pub report: Option<VerificationReport>,
    pub stats: GenerationStats,
}

pub struct Generator {
    config: GeneratorConfig,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Parse, merge, filter and resolve the headers.
    pub fn resolve(&self, headers: &[HeaderSource]) -> Result<ResolvedConstants> {
        let mut stats = GenerationStats {
            headers: headers.len(),
            ..Default::default()
        };

        let mut records = Vec::new();
        let mut copyrights = Vec::with_capacity(headers.len());
        for header in headers {
            let parsed = parse_header(&header.file_name, &header.contents)?;
            stats.definitions += parsed.records.len();
            records.extend(parsed.records);
            copyrights.push(HeaderCopyright::new(parsed.file_name, parsed.copyright));
        }

        let mut filter = PrefixFilter::new(self.config.allowlist.clone());
        let mut constants = filter.filter(records);
        stats.ignored = filter.stats().ignored;
        stats.superseded = filter.stats().superseded;
        stats.constants = constants.len();

        let mut resolver = Resolver::new(self.config.resolver.clone());
        resolver.resolve_set(&mut constants)?;
        stats.substitutions = resolver.stats().substitutions;
        stats.max_passes = resolver.stats().max_passes;

        Ok(ResolvedConstants {
            constants,
            headers: copyrights,
            stats,
        })
    }

    /// Run the whole pipeline over in-memory headers.
    pub fn generate(&self, headers: &[HeaderSource]) -> Result<GeneratedOutput> {
        let ResolvedConstants {
            constants,
            headers,
            mut stats,
        } = self.resolve(headers)?;

        let report = if self.config.verify_system {
            let report = Verifier::new(self.config.toolchain.clone()).verify_all(constants.records())?;
            stats.verified = report.checked();
            Some(report)
        } else {
            None
        };

        let unit = GenerationUnit::new(constants.records(), &headers)
            .with_report(report.as_ref())
            .with_verbose(self.config.verbose);
        let text = emitter_for(&self.config).emit(&unit)?;

        if self.config.compile_check {
            compile_check(&text, &self.config)?;
        }

        info!(
            "Generated {} {} constants from {} headers ({} ignored, {} superseded)",
            stats.constants, self.config.target, stats.headers, stats.ignored, stats.superseded
        );

        Ok(GeneratedOutput {
            text,
            target: self.config.target,
            constants,
            report,
            stats,
        })
    }

    /// Read the headers from disk, in order, and run the pipeline.
    pub fn generate_from_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<GeneratedOutput> {
        let headers = paths
            .iter()
            .map(|path| HeaderSource::read(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.generate(&headers)
    }
}
