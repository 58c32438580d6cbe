//! Constant records and the ordered set they live in

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A resolved constant value.
///
/// Displays as `0x` followed by uppercase hex digits, zero-padded to at least
/// eight digits. Wider values keep all their digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct HexLiteral(pub u64);

impl HexLiteral {
    /// Numeric value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HexLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Error returned when text is not a `0x`-prefixed hex literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseHexLiteralError(String);

impl fmt::Display for ParseHexLiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a hex literal: '{}'", self.0)
    }
}

impl std::error::Error for ParseHexLiteralError {}

impl FromStr for HexLiteral {
    type Err = ParseHexLiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ParseHexLiteralError(s.to_string()))?;
        u64::from_str_radix(digits, 16)
            .map(HexLiteral)
            .map_err(|_| ParseHexLiteralError(s.to_string()))
    }
}

impl From<HexLiteral> for String {
    fn from(hex: HexLiteral) -> Self {
        hex.to_string()
    }
}

impl TryFrom<String> for HexLiteral {
    type Error = ParseHexLiteralError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One substitution performed while resolving a constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStep {
    /// Expression before the substitution
    pub expression: String,
    /// Symbol that was found in the expression
    pub symbol: String,
    /// Parenthesised text that replaced every occurrence of the symbol
    pub replacement: String,
}

/// A `#define` statement and its resolution state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantRecord {
    /// Macro name
    pub name: String,

    /// Unparsed value expression as written in the header
    raw_value: String,

    /// Header the definition came from
    pub source_file: String,

    /// Line number in the header (1-indexed)
    pub source_line: usize,

    /// Original line with comment delimiters defused
    pub line: String,

    /// Value after resolution
    resolved_value: Option<HexLiteral>,

    /// Substitutions performed during resolution, in order
    resolution_trace: Vec<ResolutionStep>,
}

impl ConstantRecord {
    pub fn new(name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_value: raw_value.into(),
            source_file: String::new(),
            source_line: 0,
            line: String::new(),
            resolved_value: None,
            resolution_trace: Vec::new(),
        }
    }

    pub fn with_source(mut self, file: impl Into<String>, line_number: usize) -> Self {
        self.source_file = file.into();
        self.source_line = line_number;
        self
    }

    /// Store the original line, defusing `/*` and `*/` so the text can be
    /// embedded in a generated block comment.
    pub fn with_line(mut self, line: &str) -> Self {
        self.line = escape_comment_delimiters(line);
        self
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn resolved_value(&self) -> Option<HexLiteral> {
        self.resolved_value
    }

    pub fn resolution_trace(&self) -> &[ResolutionStep] {
        &self.resolution_trace
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_value.is_some()
    }

    /// Text substituted for this symbol inside other expressions
    pub fn substitution_text(&self) -> String {
        match self.resolved_value {
            Some(hex) => format!("({hex})"),
            None => format!("({})", self.raw_value),
        }
    }

    /// Record the outcome of resolution. A record is resolved only once.
    pub(crate) fn mark_resolved(&mut self, value: HexLiteral, trace: Vec<ResolutionStep>) {
        debug_assert!(
            self.resolved_value.is_none(),
            "{} resolved twice",
            self.name
        );
        self.resolved_value = Some(value);
        self.resolution_trace = trace;
    }
}

fn escape_comment_delimiters(line: &str) -> String {
    line.replace("/*", "/ *").replace("*/", "* /")
}

/// Insertion-ordered collection of records keyed by name.
///
/// Inserting a name that is already present removes the earlier record and
/// appends the new one, so later definitions supersede earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantSet {
    records: Vec<ConstantRecord>,
}

impl ConstantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it superseded.
    pub fn insert(&mut self, record: ConstantRecord) -> Option<ConstantRecord> {
        let previous = self
            .records
            .iter()
            .position(|r| r.name == record.name)
            .map(|index| self.records.remove(index));
        self.records.push(record);
        previous
    }

    pub fn get(&self, name: &str) -> Option<&ConstantRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstantRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ConstantRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [ConstantRecord] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<ConstantRecord> {
        self.records
    }

    /// Map of name to position, for lookups over large sets
    pub fn index(&self) -> HashMap<&str, usize> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.as_str(), i))
            .collect()
    }
}

impl FromIterator<ConstantRecord> for ConstantSet {
    fn from_iter<I: IntoIterator<Item = ConstantRecord>>(iter: I) -> Self {
        let mut set = ConstantSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl IntoIterator for ConstantSet {
    type Item = ConstantRecord;
    type IntoIter = std::vec::IntoIter<ConstantRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConstantSet {
    type Item = &'a ConstantRecord;
    type IntoIter = std::slice::Iter<'a, ConstantRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_literal_display() {
        assert_eq!(HexLiteral(0).to_string(), "0x00000000");
        assert_eq!(HexLiteral(0x80000000).to_string(), "0x80000000");
        assert_eq!(HexLiteral(0xce534350).to_string(), "0xCE534350");
        assert_eq!(HexLiteral(0x1_0000_0000).to_string(), "0x100000000");
        assert_eq!(HexLiteral(u64::MAX).to_string(), "0xFFFFFFFFFFFFFFFF");
    }

    #[test]
    fn test_hex_literal_parse() {
        assert_eq!("0x80000000".parse::<HexLiteral>().unwrap(), HexLiteral(0x80000000));
        assert_eq!("0XABC".parse::<HexLiteral>().unwrap(), HexLiteral(0xabc));
        assert!("80000000".parse::<HexLiteral>().is_err());
        assert!("0xZZ".parse::<HexLiteral>().is_err());
    }

    #[test]
    fn test_line_comment_delimiters_escaped() {
        let record = ConstantRecord::new("CKA_X", "1").with_line("#define CKA_X 1 /* x */");
        assert_eq!(record.line, "#define CKA_X 1 / * x * /");
    }

    #[test]
    fn test_substitution_text_prefers_resolved_value() {
        let mut record = ConstantRecord::new("CKA_X", "CKA_Y | 1");
        assert_eq!(record.substitution_text(), "(CKA_Y | 1)");
        record.mark_resolved(HexLiteral(3), Vec::new());
        assert_eq!(record.substitution_text(), "(0x00000003)");
    }

    #[test]
    fn test_set_insert_last_wins_and_moves_to_end() {
        let mut set = ConstantSet::new();
        set.insert(ConstantRecord::new("CKA_X", "1"));
        set.insert(ConstantRecord::new("CKA_Y", "2"));
        let previous = set.insert(ConstantRecord::new("CKA_X", "3"));

        assert_eq!(previous.map(|r| r.raw_value().to_string()), Some("1".to_string()));
        let names: Vec<_> = set.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["CKA_Y", "CKA_X"]);
        assert_eq!(set.get("CKA_X").unwrap().raw_value(), "3");
        assert_eq!(set.index()["CKA_X"], 1);
    }

    #[test]
    fn test_record_serializes_hex_as_string() {
        let mut record = ConstantRecord::new("CKO_VENDOR_DEFINED", "0x80000000UL");
        record.mark_resolved(HexLiteral(0x80000000), Vec::new());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["resolved_value"], "0x80000000");
    }
}
