//! Rust module emitter

use crate::config::TargetLanguage;
use crate::emitter::{comment_block, require_resolved, ConstantEmitter, GenerationUnit};
use crate::error::Result;
use std::fmt::Write;

/// Emits a module of `pub const NAME: u64` items
#[derive(Debug, Default)]
pub struct RustEmitter;

impl RustEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl ConstantEmitter for RustEmitter {
    fn target(&self) -> TargetLanguage {
        TargetLanguage::Rust
    }

    fn emit(&self, unit: &GenerationUnit<'_>) -> Result<String> {
        let mut out = String::from(
            "//! PKCS#11 constants generated by constgen from NSS's pkcs11t.h and\n\
             //! pkcs11n.h headers. Do not edit by hand.\n\n",
        );

        for header in unit.headers {
            let _ = writeln!(out, "// Copyright statements from {}", header.file_name);
            out.push_str(&comment_block("// ", header.text.trim_end()));
            out.push('\n');
        }

        out.push_str("#![allow(non_upper_case_globals)]\n");

        for record in unit.records {
            let value = require_resolved(record)?;

            let _ = write!(out, "\n/// Source file: {}\n", record.source_file);
            if unit.verbose {
                out.push_str("///\n");
                let _ = writeln!(out, "/// Line number: {}", record.source_line);
                let _ = writeln!(out, "/// Line: `{}`", record.line);
                let _ = writeln!(out, "/// Parsed value: `{}`", record.raw_value());
                for step in record.resolution_trace() {
                    let _ = writeln!(
                        out,
                        "/// Resolution step: in `{}` replaced `{}` with `{}`",
                        step.expression, step.symbol, step.replacement
                    );
                }
            }
            if let Some(probe) = unit.probe_output(&record.name) {
                for (stream, text) in [("stdout", &probe.stdout), ("stderr", &probe.stderr)] {
                    if !text.is_empty() {
                        let _ = writeln!(out, "///\n/// check {stream}:");
                        out.push_str(&comment_block("/// ", text.trim_end()));
                    }
                }
            }
            let _ = writeln!(out, "pub const {}: u64 = {};", record.name, value);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::HeaderCopyright;
    use constgen::{resolve_all, ConstantRecord};

    #[test]
    fn test_emit_constants() {
        let mut records = vec![
            ConstantRecord::new("CKA_CLASS", "0x00000000UL").with_source("pkcs11t.h", 12),
            ConstantRecord::new("CKA_TOKEN", "(CKA_CLASS + 1)").with_source("pkcs11t.h", 13),
        ];
        resolve_all(&mut records).unwrap();
        let headers = vec![HeaderCopyright::new("pkcs11t.h", "/* OASIS\n * Open\n */\n\n")];

        let text = RustEmitter::new()
            .emit(&GenerationUnit::new(&records, &headers))
            .unwrap();

        assert!(text.contains("// Copyright statements from pkcs11t.h\n// /* OASIS\n// * Open\n// */\n\n"));
        assert!(text.contains("\n/// Source file: pkcs11t.h\npub const CKA_CLASS: u64 = 0x00000000;\n"));
        assert!(text.contains("pub const CKA_TOKEN: u64 = 0x00000001;\n"));
        assert!(text.find("#![allow").unwrap() < text.find("pub const").unwrap());
    }

    #[test]
    fn test_verbose_trace_in_docs() {
        let mut records = vec![
            ConstantRecord::new("CKA_A", "1"),
            ConstantRecord::new("CKA_B", "CKA_A").with_source("x.h", 2),
        ];
        resolve_all(&mut records).unwrap();

        let text = RustEmitter::new()
            .emit(&GenerationUnit::new(&records[1..], &[]).with_verbose(true))
            .unwrap();
        assert!(text.contains("/// Resolution step: in `CKA_A` replaced `CKA_A` with `(0x00000001)`\n"));
    }
}
