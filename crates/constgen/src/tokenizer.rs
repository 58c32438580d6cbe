//! Whitespace tokenizer for `#define` lines
//!
//! A token is a contiguous run of non-whitespace characters. An open
//! parenthesis lets the token continue across whitespace until the matching
//! close, so `(CKO_VENDOR_DEFINED | NSSCK_VENDOR_NSS)` is a single token.

use crate::error::SyntaxError;

/// Read one token from `line` starting at byte `offset`.
///
/// Returns the token and the byte offset just past its end. Past the end of
/// the line the token is empty.
///
/// # Errors
///
/// [`SyntaxError::UnbalancedParenthesis`] when the line ends with an open
/// parenthesis group, which means the definition continues on another line.
pub fn next_token(line: &str, offset: usize) -> Result<(&str, usize), SyntaxError> {
    let rest = line.get(offset..).unwrap_or("");

    let start = rest
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| offset + i)
        .unwrap_or(line.len());

    let mut depth: i32 = 0;
    let mut end = line.len();
    for (i, c) in line[start..].char_indices() {
        if c.is_whitespace() && depth == 0 {
            end = start + i;
            break;
        }
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(SyntaxError::UnbalancedParenthesis {
            line: line.to_string(),
        });
    }

    Ok((&line[start..end], end))
}

/// Split a whole line into tokens.
pub fn tokenize(line: &str) -> Result<Vec<&str>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    loop {
        let (token, end) = next_token(line, offset)?;
        if token.is_empty() {
            break;
        }
        tokens.push(token);
        offset = end;
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        let line = "#define CKA_CLASS 0x00000000UL";
        let (first, end) = next_token(line, 0).unwrap();
        assert_eq!(first, "#define");
        let (name, end) = next_token(line, end).unwrap();
        assert_eq!(name, "CKA_CLASS");
        let (value, end) = next_token(line, end).unwrap();
        assert_eq!(value, "0x00000000UL");
        assert_eq!(end, line.len());
    }

    #[test]
    fn test_parenthesised_group_is_one_token() {
        let line = "#define CKO_NSS (CKO_VENDOR_DEFINED | NSSCK_VENDOR_NSS)";
        let tokens = tokenize(line).unwrap();
        assert_eq!(
            tokens,
            vec!["#define", "CKO_NSS", "(CKO_VENDOR_DEFINED | NSSCK_VENDOR_NSS)"]
        );
    }

    #[test]
    fn test_nested_parentheses() {
        let tokens = tokenize("#define X ((A | B) << (1 + 2)) /* note */").unwrap();
        assert_eq!(tokens[2], "((A | B) << (1 + 2))");
        assert_eq!(tokens[3], "/*");
    }

    #[test]
    fn test_leading_whitespace_is_skipped() {
        let (token, end) = next_token("   \tCKA_X  ", 0).unwrap();
        assert_eq!(token, "CKA_X");
        assert_eq!(end, 9);
    }

    #[test]
    fn test_offset_past_end_yields_empty_token() {
        let (token, end) = next_token("#define", 7).unwrap();
        assert_eq!(token, "");
        assert_eq!(end, 7);

        let (token, _) = next_token("abc", 10).unwrap();
        assert_eq!(token, "");
    }

    #[test]
    fn test_unbalanced_parenthesis() {
        let err = next_token("#define CKA_X (CKA_Y | \\", 14).unwrap_err();
        assert!(matches!(err, SyntaxError::UnbalancedParenthesis { .. }));
    }

    #[test]
    fn test_stray_close_parenthesis() {
        let err = tokenize("#define CKA_X 1)").unwrap_err();
        assert!(matches!(err, SyntaxError::UnbalancedParenthesis { .. }));
    }
}
