use constgen::ConstantsError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for generation
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur after the headers have been read
#[derive(Error, Debug)]
pub enum CodegenError {
    /// Parsing or resolution failed
    #[error(transparent)]
    Constants(#[from] ConstantsError),

    /// The system headers define a different value
    #[error("Value for symbol '{name}' differs from system headers: wasn't '{expected}' (files kept in {})", .dir.display())]
    ValueMismatch {
        name: String,
        expected: String,
        dir: PathBuf,
    },

    /// An external compiler rejected its input
    #[error("{tool} failed on {subject} ({status}){}", kept(.dir))]
    CompileError {
        tool: String,
        subject: String,
        status: String,
        stdout: String,
        stderr: String,
        dir: Option<PathBuf>,
    },

    /// An emitter was handed a record without a value
    #[error("Must resolve all references before emitting: {name} is unresolved")]
    UnresolvedRecord { name: String },

    /// An external tool could not be started
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a file failed
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn kept(dir: &Option<PathBuf>) -> String {
    match dir {
        Some(dir) => format!(", files kept in {}", dir.display()),
        None => String::new(),
    }
}

impl CodegenError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
