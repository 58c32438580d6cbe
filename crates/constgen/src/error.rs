//! Error types for header parsing and constant resolution.
//!
//! Line-level problems are reported as [`SyntaxError`], expression-level
//! problems as [`EvalError`]. Both are lifted into [`ConstantsError`] once the
//! offending file, line and symbol are known.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for constgen operations.
pub type Result<T> = std::result::Result<T, ConstantsError>;

/// A single header line could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// The line does not start with `#define`
    #[error("line doesn't begin with #define: {line}")]
    NotADefine {
        /// Offending line
        line: String,
    },

    /// The line ends inside a parenthesised group
    #[error("unbalanced parenthesis, definition spans multiple lines: {line}")]
    UnbalancedParenthesis {
        /// Offending line
        line: String,
    },
}

/// An expression could not be reduced to an integer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// An identifier survived substitution
    #[error("unresolved symbol '{symbol}'")]
    UnresolvedSymbol {
        /// Identifier found in the expression
        symbol: String,
    },

    /// Unsupported syntax, division by zero, overflow
    #[error("malformed expression '{expression}': {reason}")]
    MalformedExpression {
        /// Expression as handed to the evaluator
        expression: String,
        /// What went wrong
        reason: String,
    },
}

/// Errors produced while turning header text into resolved constants.
///
/// Every variant carries the source location so the caller can point at the
/// definition that stopped the run.
#[derive(Error, Debug)]
pub enum ConstantsError {
    /// A `#define` line could not be tokenized
    #[error("{file}:{line_number}: {source}")]
    Syntax {
        /// Header file name
        file: String,
        /// 1-based line number
        line_number: usize,
        /// Underlying line error
        #[source]
        source: SyntaxError,
    },

    /// A symbol referenced by a definition is not known
    #[error("cannot resolve {name} ({file}:{line_number}): unresolved symbol '{symbol}'")]
    UnresolvedSymbol {
        /// Constant being resolved
        name: String,
        /// Identifier left in the expression
        symbol: String,
        /// Header file name
        file: String,
        /// 1-based line number
        line_number: usize,
    },

    /// The fully substituted expression is not a valid integer expression
    #[error("cannot resolve {name} ({file}:{line_number}): malformed expression '{expression}': {reason}")]
    MalformedExpression {
        /// Constant being resolved
        name: String,
        /// Expression after substitution
        expression: String,
        /// What went wrong
        reason: String,
        /// Header file name
        file: String,
        /// 1-based line number
        line_number: usize,
    },

    /// Substitution did not reach a fixed point within the pass limit
    #[error("cyclic reference while resolving {name} ({file}:{line_number}): {}", .chain.join(" -> "))]
    CyclicReference {
        /// Constant being resolved
        name: String,
        /// Symbols still being substituted when the limit was hit
        chain: Vec<String>,
        /// Header file name
        file: String,
        /// 1-based line number
        line_number: usize,
    },

    /// Failed to read a header
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        /// Header path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ConstantsError {
    /// Attach a location to a line-level error.
    pub fn syntax(file: impl Into<String>, line_number: usize, source: SyntaxError) -> Self {
        Self::Syntax {
            file: file.into(),
            line_number,
            source,
        }
    }

    /// Attach the symbol and its location to an evaluation error.
    pub fn from_eval(
        err: EvalError,
        name: impl Into<String>,
        file: impl Into<String>,
        line_number: usize,
    ) -> Self {
        match err {
            EvalError::UnresolvedSymbol { symbol } => Self::UnresolvedSymbol {
                name: name.into(),
                symbol,
                file: file.into(),
                line_number,
            },
            EvalError::MalformedExpression { expression, reason } => Self::MalformedExpression {
                name: name.into(),
                expression,
                reason,
                file: file.into(),
                line_number,
            },
        }
    }

    /// Name of the constant involved, if the error concerns one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::UnresolvedSymbol { name, .. }
            | Self::MalformedExpression { name, .. }
            | Self::CyclicReference { name, .. } => Some(name),
            Self::Syntax { .. } | Self::Io { .. } => None,
        }
    }
}
