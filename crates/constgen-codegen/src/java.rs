//! Java interface emitter
//!
//! Produces one `public interface` holding every constant as a
//! `public static final long`. Values are typed `long` because several exceed
//! the range of a signed `int` (`CKT_NSS` is `0xCE534350`) and Java has no
//! unsigned integers.

use crate::config::TargetLanguage;
use crate::emitter::{comment_block, require_resolved, ConstantEmitter, GenerationUnit};
use crate::error::Result;
use constgen::ConstantRecord;
use std::fmt::Write;

const COMMENT_PREFIX: &str = "     * ";

pub struct JavaEmitter {
    package: String,
    type_name: String,
}

impl JavaEmitter {
    pub fn new(package: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            type_name: type_name.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    fn banner(&self) -> String {
        format!(
            "/**\n\
             \x20* {}.java\n\
             \x20*\n\
             \x20* This file is automatically generated by constgen from the contents of\n\
             \x20* NSS's pkcs11t.h and pkcs11n.h headers. Do not edit it by hand;\n\
             \x20* regenerate it from the headers instead.\n\
             \x20*\n\
             \x20* Below are the copyright statements for the sourced files:\n\
             \x20*/\n",
            self.type_name
        )
    }

    fn constant(&self, record: &ConstantRecord, unit: &GenerationUnit<'_>) -> Result<String> {
        let value = require_resolved(record)?;

        let mut out = String::from("\n    /**\n");
        out.push_str(
            "     * Content automatically generated; see NSS documentation for more information.\n",
        );
        out.push_str("     *\n");
        let _ = writeln!(out, "     * Source file: {}", record.source_file);

        if unit.verbose {
            let _ = writeln!(out, "     * Line number: {}", record.source_line);
            let _ = writeln!(out, "     * Line: {}", record.line);
            let _ = writeln!(out, "     * Parsed name: {}", record.name);
            let _ = writeln!(out, "     * Parsed value: {}", record.raw_value());

            let trace = record.resolution_trace();
            if !trace.is_empty() {
                out.push_str("     *\n");
                for step in trace {
                    let _ = writeln!(out, "     * Resolution step: in [{}]", step.expression);
                    let _ = writeln!(
                        out,
                        "     *   replaced [{}] with [{}]",
                        step.symbol, step.replacement
                    );
                }
            }
        }

        if let Some(probe) = unit.probe_output(&record.name) {
            if !probe.stdout.is_empty() {
                out.push_str("     *\n     * check stdout:\n");
                out.push_str(&comment_block(COMMENT_PREFIX, &probe.stdout));
            }
            if !probe.stderr.is_empty() {
                out.push_str("     *\n     * check stderr:\n");
                out.push_str(&comment_block(COMMENT_PREFIX, &probe.stderr));
            }
        }

        out.push_str("     */\n");
        let _ = writeln!(out, "    public static final long {} = {}L;", record.name, value);
        Ok(out)
    }
}

impl ConstantEmitter for JavaEmitter {
    fn target(&self) -> TargetLanguage {
        TargetLanguage::Java
    }

    fn emit(&self, unit: &GenerationUnit<'_>) -> Result<String> {
        let mut out = self.banner();

        for header in unit.headers {
            let _ = writeln!(out, "/* Copyright statements from {} */", header.file_name);
            out.push_str(&header.text);
        }

        let _ = write!(
            out,
            "package {};\n\npublic interface {} {{\n",
            self.package, self.type_name
        );

        for record in unit.records {
            out.push_str(&self.constant(record, unit)?);
        }

        out.push_str("}\n");
        Ok(out)
    }
}
