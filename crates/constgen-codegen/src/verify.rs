//! Verification against installed NSS headers
//!
//! For every resolved constant a tiny C program is compiled against the
//! system `pkcs11t.h` / `pkcs11n.h` and run; it exits nonzero when the
//! header's value differs from ours. One program per constant makes the
//! offending symbol obvious when a check fails.

use crate::check::scratch_dir;
use crate::config::Toolchain;
use crate::emitter::require_resolved;
use crate::error::{CodegenError, Result};
use constgen::{ConstantRecord, HexLiteral};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::process::{Command, Stdio};

/// pkg-config package providing the PKCS#11 headers
const NSS_PACKAGE: &str = "nss";

/// Compiler output captured while checking one constant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ProbeOutput {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Outcome of a verification run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    checked: usize,
    outputs: HashMap<String, ProbeOutput>,
}

impl VerificationReport {
    /// Number of constants that passed
    pub fn checked(&self) -> usize {
        self.checked
    }

    /// Compiler output for a constant, if the compiler printed anything
    pub fn get(&self, name: &str) -> Option<&ProbeOutput> {
        self.outputs.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, output: ProbeOutput) {
        self.outputs.insert(name.into(), output);
    }

    fn record_pass(&mut self, name: &str, output: ProbeOutput) {
        self.checked += 1;
        if !output.is_empty() {
            self.insert(name, output);
        }
    }
}

/// Source of the probe program for one constant
pub fn probe_source(name: &str, value: HexLiteral) -> String {
    format!(
        "#include \"pkcs11t.h\"\n\
         #include \"pkcs11n.h\"\n\
         \n\
         int main() {{\n\
         \x20   if ({name} != {value}) {{\n\
         \x20       return 1;\n\
         \x20   }}\n\
         \x20   return 0;\n\
         }}\n"
    )
}

/// Checks resolved values by compiling probe programs
pub struct Verifier {
    toolchain: Toolchain,
}

impl Verifier {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    /// Compiler and linker flags for NSS as reported by pkg-config.
    ///
    /// Empty output yields no flags.
    pub fn nss_flags(&self) -> Result<Vec<String>> {
        let tool = &self.toolchain.pkg_config;
        let output = Command::new(tool)
            .args(["--libs", "--cflags", NSS_PACKAGE])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CodegenError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CodegenError::CompileError {
                tool: tool.clone(),
                subject: NSS_PACKAGE.to_string(),
                status: output.status.to_string(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                dir: None,
            });
        }

        let flags: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .map(str::to_string)
            .collect();
        debug!("NSS flags: {:?}", flags);
        Ok(flags)
    }

    /// Check every record, stopping at the first failure.
    pub fn verify_all(&self, records: &[ConstantRecord]) -> Result<VerificationReport> {
        info!("Performing extended value checks on {} constants", records.len());
        let flags = self.nss_flags()?;

        let mut report = VerificationReport::default();
        for record in records {
            let output = self.verify(record, &flags)?;
            report.record_pass(&record.name, output);
        }

        info!("Verified {} constants against system headers", report.checked());
        Ok(report)
    }

    /// Compile and run the probe for one record.
    ///
    /// # Errors
    ///
    /// [`CodegenError::CompileError`] if the probe does not compile,
    /// [`CodegenError::ValueMismatch`] if it runs and reports a different
    /// value. Either way the scratch directory is kept for inspection.
    pub fn verify(&self, record: &ConstantRecord, nss_flags: &[String]) -> Result<ProbeOutput> {
        let value = require_resolved(record)?;
        let dir = scratch_dir()?;
        let source = dir.path().join("probe.c");
        let exe = dir.path().join("probe");

        fs::write(&source, probe_source(&record.name, value))
            .map_err(|err| CodegenError::io(&source, err))?;

        let cc = &self.toolchain.cc;
        let output = Command::new(cc)
            .arg("-o")
            .arg(&exe)
            .arg(&source)
            .args(nss_flags)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CodegenError::Spawn {
                tool: cc.clone(),
                source,
            })?;

        let probe = ProbeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !probe.stdout.is_empty() {
            warn!("When checking symbol '{}' (stdout):\n{}", record.name, probe.stdout);
        }
        if !probe.stderr.is_empty() {
            warn!("When checking symbol '{}' (stderr):\n{}", record.name, probe.stderr);
        }

        if !output.status.success() {
            return Err(CodegenError::CompileError {
                tool: cc.clone(),
                subject: record.name.clone(),
                status: output.status.to_string(),
                stdout: probe.stdout,
                stderr: probe.stderr,
                dir: Some(dir.keep()),
            });
        }

        let status = match Command::new(&exe).stdin(Stdio::null()).status() {
            Ok(status) => status,
            Err(source) => {
                let _ = dir.keep();
                return Err(CodegenError::Spawn {
                    tool: exe.display().to_string(),
                    source,
                });
            }
        };

        if !status.success() {
            return Err(CodegenError::ValueMismatch {
                name: record.name.clone(),
                expected: value.to_string(),
                dir: dir.keep(),
            });
        }

        debug!("{} = {} confirmed", record.name, value);
        Ok(probe)
    }
}
