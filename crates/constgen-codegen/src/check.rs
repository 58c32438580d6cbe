//! Compile check of generated output
//!
//! The generated text is handed to the target toolchain before it is
//! returned, so a file that would break the consumer's build is never
//! written.

use crate::config::{GeneratorConfig, TargetLanguage};
use crate::error::{CodegenError, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Prefix of every scratch directory this crate creates
pub const SCRATCH_PREFIX: &str = "tmp-constgen-";

/// File name the Rust output is compiled as
const RUST_FILE_NAME: &str = "pkcs11_constants.rs";

pub(crate) fn scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(|source| CodegenError::io(&std::env::temp_dir(), source))
}

/// Compile `text` as the configured target language.
///
/// # Errors
///
/// [`CodegenError::CompileError`] when the compiler rejects the text; the
/// scratch directory holding the file is kept and named in the error.
/// [`CodegenError::Spawn`] when the compiler cannot be started.
pub fn compile_check(text: &str, config: &GeneratorConfig) -> Result<()> {
    match config.target {
        TargetLanguage::Java => {
            let file_name = format!("{}.java", config.type_name);
            compile_in_scratch_dir(&config.toolchain.javac, &file_name, text, |cmd, _dir, file| {
                cmd.arg(file);
            })?;
        }
        TargetLanguage::Rust => {
            compile_in_scratch_dir(&config.toolchain.rustc, RUST_FILE_NAME, text, |cmd, dir, file| {
                cmd.args(["--crate-type", "lib", "--emit", "metadata", "--out-dir"])
                    .arg(dir)
                    .arg(file);
            })?;
        }
        TargetLanguage::Json => {
            serde_json::from_str::<serde_json::Value>(text).map_err(|err| {
                CodegenError::CompileError {
                    tool: "serde_json".to_string(),
                    subject: "generated JSON".to_string(),
                    status: err.to_string(),
                    stdout: String::new(),
                    stderr: String::new(),
                    dir: None,
                }
            })?;
        }
    }

    info!("Generated {} output passed the compile check", config.target);
    Ok(())
}

fn compile_in_scratch_dir(
    tool: &str,
    file_name: &str,
    text: &str,
    configure: impl FnOnce(&mut Command, &Path, &Path),
) -> Result<()> {
    let dir = scratch_dir()?;
    let path = dir.path().join(file_name);
    fs::write(&path, text).map_err(|source| CodegenError::io(&path, source))?;

    let mut cmd = Command::new(tool);
    configure(&mut cmd, dir.path(), &path);
    debug!("Running {:?}", cmd);

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| CodegenError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(CodegenError::CompileError {
            tool: tool.to_string(),
            subject: file_name.to_string(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            dir: Some(dir.keep()),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_check_rejects_truncated_document() {
        let config = GeneratorConfig::default().with_target(TargetLanguage::Json);
        assert!(matches!(
            compile_check("{\"constants\": [", &config),
            Err(CodegenError::CompileError { dir: None, .. })
        ));
        assert!(compile_check("{\"constants\": []}\n", &config).is_ok());
    }

    #[test]
    fn test_missing_compiler_is_spawn_error() {
        let mut config = GeneratorConfig::default();
        config.toolchain.javac = "/nonexistent/javac".to_string();

        let err = compile_check("interface X {}", &config).unwrap_err();
        assert!(matches!(err, CodegenError::Spawn { ref tool, .. } if tool == "/nonexistent/javac"));
    }
}
