//! Leading comment extraction
//!
//! Headers carry their license text in the comments before the first
//! preprocessor directive. The scanner walks lines from the top, keeping
//! every line that opens, closes or sits inside a block comment, and stops at
//! the first `#` seen outside a comment.
//!
//! This is a line-level scan, not a lexer. A line holding both markers is
//! treated as a closed one-line comment only when the opener comes first and
//! the line ends with the closer; anything else on such a line leaves the
//! scanner inside a comment. That classification is a heuristic and is not
//! guaranteed to match what a C compiler sees.

const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Between comments, before any directive
    OutsideComment,
    /// Inside a block comment
    InsideComment,
    /// A directive was seen outside a comment; scanning is over
    DirectivesStarted,
}

/// Line-driven state machine collecting the leading comment block
#[derive(Debug, Clone)]
pub struct CopyrightScanner {
    state: ScanState,
    lines: Vec<String>,
}

impl Default for CopyrightScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyrightScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::OutsideComment,
            lines: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feed one line (trailing whitespace already removed). Returns the
    /// state after the line.
    pub fn feed(&mut self, line: &str) -> ScanState {
        if self.state == ScanState::DirectivesStarted {
            return self.state;
        }

        let open = line.find(COMMENT_OPEN);
        let close = line.find(COMMENT_CLOSE);

        let (next, keep) = match (open, close) {
            (Some(open), Some(close)) => {
                if open < close && line.ends_with(COMMENT_CLOSE) {
                    (ScanState::OutsideComment, true)
                } else {
                    (ScanState::InsideComment, true)
                }
            }
            (Some(_), None) => (ScanState::InsideComment, true),
            (None, Some(_)) => (ScanState::OutsideComment, true),
            (None, None) => match self.state {
                ScanState::InsideComment => (ScanState::InsideComment, true),
                _ if line.contains('#') => (ScanState::DirectivesStarted, false),
                _ => (ScanState::OutsideComment, false),
            },
        };

        if keep {
            self.lines.push(line.to_string());
        }
        self.state = next;
        next
    }

    /// Collected lines joined by newlines, followed by a blank line
    pub fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push_str("\n\n");
        text
    }
}

/// Collect the comment block before the first directive of a header.
pub fn extract_copyright<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    let mut scanner = CopyrightScanner::new();
    for line in lines {
        if scanner.feed(line.trim_end()) == ScanState::DirectivesStarted {
            break;
        }
    }
    scanner.finish()
}
