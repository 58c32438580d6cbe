//! `#define` statement parsing
//!
//! Only the restricted dialect found in token-interface headers is
//! understood: single-line, object-like `#define NAME VALUE`. The value is
//! kept as opaque text; the resolver gives it meaning later.

use crate::copyright::extract_copyright;
use crate::error::{ConstantsError, Result, SyntaxError};
use crate::record::ConstantRecord;
use crate::tokenizer::next_token;
use log::{debug, info};
use std::fs;
use std::path::Path;

const DEFINE: &str = "#define";

/// Output of parsing one header
#[derive(Debug, Clone)]
pub struct ParsedHeader {
    /// File name the records refer to
    pub file_name: String,
    /// Every `#define` in file order
    pub records: Vec<ConstantRecord>,
    /// Comment block preceding the first directive
    pub copyright: String,
}

/// Split a `#define` line into name and value expression.
///
/// # Errors
///
/// [`SyntaxError::NotADefine`] if the trimmed line doesn't start with
/// `#define`, [`SyntaxError::UnbalancedParenthesis`] for definitions that
/// continue on the next line.
pub fn parse_define(line: &str) -> std::result::Result<(String, String), SyntaxError> {
    let line = line.trim();
    if !line.starts_with(DEFINE) {
        return Err(SyntaxError::NotADefine {
            line: line.to_string(),
        });
    }

    let (name, name_end) = next_token(line, DEFINE.len())?;
    let (value, _) = next_token(line, name_end)?;

    Ok((name.to_string(), value.to_string()))
}

/// Parse every `#define` of a header and its leading comment block.
pub fn parse_header(file_name: &str, contents: &str) -> Result<ParsedHeader> {
    let lines: Vec<&str> = contents.lines().map(str::trim_end).collect();

    let mut records = Vec::new();
    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim_start();
        if !line.starts_with(DEFINE) {
            continue;
        }

        let line_number = index + 1;
        let (name, value) = parse_define(line)
            .map_err(|source| ConstantsError::syntax(file_name, line_number, source))?;
        debug!("{file_name}:{line_number}: {name} = {value}");

        records.push(
            ConstantRecord::new(name, value)
                .with_source(file_name, line_number)
                .with_line(line),
        );
    }

    let copyright = extract_copyright(lines.iter().copied());
    info!("Parsed {} definitions from {}", records.len(), file_name);

    Ok(ParsedHeader {
        file_name: file_name.to_string(),
        records,
        copyright,
    })
}

/// Read and parse a header from disk.
///
/// Records are tagged with the path as given.
pub fn parse_header_file(path: &Path) -> Result<ParsedHeader> {
    let contents = fs::read_to_string(path).map_err(|source| ConstantsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_header(&path.display().to_string(), &contents)
}
