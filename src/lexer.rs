//! Two-pass lexer: pass 1 splits a line into command segments by operator,
//! honoring quoting; pass 2 tokenizes a single segment into name/args/
//! redirects. Both passes share the same quoting and escape rules (§4.1).

use crate::errors::ParseError;
use crate::types::{Command, OperatorType};
use std::collections::HashMap;

/// Pass 1 result: raw segment text plus the operator that preceded it
/// (`None` for the first segment).
struct RawSegment {
    text: String,
    op_before: Option<OperatorType>,
}

/// Split a line into command segments and connecting operators.
///
/// Returns the segment texts (already stripped of the operators themselves)
/// together with `operators`/`trailing_background`, which the parser turns
/// into a `CommandChain`. Operators inside quotes are never recognized.
pub fn split_chain(input: &str) -> Result<(Vec<String>, Vec<OperatorType>, bool), ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut i = 0usize;
    let mut start = 0usize;
    let mut in_single = false;
    let mut in_double = false;

    let mut raw: Vec<RawSegment> = vec![RawSegment {
        text: String::new(),
        op_before: None,
    }];

    macro_rules! push_segment {
        ($end:expr, $op:expr) => {{
            raw.last_mut().unwrap().text = chars[start..$end].iter().collect();
            raw.push(RawSegment {
                text: String::new(),
                op_before: Some($op),
            });
        }};
    }

    while i < len {
        let c = chars[i];
        if c == '\\' && i + 1 < len {
            i += 2;
            continue;
        }
        if !in_single && !in_double {
            match c {
                '"' => {
                    in_double = true;
                    i += 1;
                }
                '\'' => {
                    in_single = true;
                    i += 1;
                }
                '&' if chars.get(i + 1) == Some(&'&') => {
                    push_segment!(i, OperatorType::And);
                    i += 2;
                    start = i;
                }
                '|' if chars.get(i + 1) == Some(&'|') => {
                    push_segment!(i, OperatorType::Or);
                    i += 2;
                    start = i;
                }
                ';' => {
                    push_segment!(i, OperatorType::Sequence);
                    i += 1;
                    start = i;
                }
                '|' => {
                    push_segment!(i, OperatorType::Pipe);
                    i += 1;
                    start = i;
                }
                '&' => {
                    push_segment!(i, OperatorType::Background);
                    i += 1;
                    start = i;
                }
                _ => i += 1,
            }
        } else if in_double {
            if c == '"' {
                in_double = false;
            }
            i += 1;
        } else {
            // in_single
            if c == '\'' {
                in_single = false;
            }
            i += 1;
        }
    }

    if in_single || in_double {
        return Err(ParseError::UnterminatedQuote);
    }
    raw.last_mut().unwrap().text = chars[start..].iter().collect();

    // Trailing bare '&': background the whole chain rather than model an
    // empty command after it (see DESIGN.md, Open Question resolution).
    let mut trailing_background = false;
    if raw.len() > 1 {
        let last_is_empty = raw.last().unwrap().text.trim().is_empty();
        if last_is_empty && raw.last().unwrap().op_before == Some(OperatorType::Background) {
            trailing_background = true;
            raw.pop();
        }
    }

    // Collapse any remaining empty segments (e.g. `;;`), dropping the
    // operator that introduced them.
    let mut segments = Vec::new();
    let mut operators = Vec::new();
    for seg in raw {
        if seg.text.trim().is_empty() {
            continue;
        }
        if let Some(op) = seg.op_before {
            if !segments.is_empty() {
                operators.push(op);
            }
        }
        segments.push(seg.text.trim().to_string());
    }

    Ok((segments, operators, trailing_background))
}

/// Tokenize a single command segment into `name`, `args`, and `redirects`.
///
/// Recognizes `>`, `>>`, `<` as redirection tokens (never split at pass 1).
pub fn tokenize_command(segment: &str) -> Result<Command, ParseError> {
    let tokens = split_words(segment)?;
    let mut name = None;
    let mut args = Vec::new();
    let mut redirects = HashMap::new();

    let mut iter = tokens.into_iter().peekable();
    while let Some(tok) = iter.next() {
        match tok.as_str() {
            ">" | ">>" | "<" => {
                let filename = iter
                    .next()
                    .ok_or_else(|| ParseError::InvalidRedirect(tok.clone()))?;
                redirects.insert(tok, filename);
            }
            _ => {
                if name.is_none() {
                    name = Some(tok);
                } else {
                    args.push(tok);
                }
            }
        }
    }

    let name = name.unwrap_or_default();
    Ok(Command {
        name,
        args,
        redirects,
    })
}

/// Word-split a segment respecting quotes and backslash-escapes.
///
/// Redirection operators (`>`, `>>`, `<`) are split out as standalone
/// tokens even when not surrounded by whitespace (`cmd>file`).
fn split_words(segment: &str) -> Result<Vec<String>, ParseError> {
    let chars: Vec<char> = segment.chars().collect();
    let len = chars.len();
    let mut i = 0usize;
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_current = false;
    let mut in_single = false;
    let mut in_double = false;

    while i < len {
        let c = chars[i];

        if c == '\\' && i + 1 < len {
            let next = chars[i + 1];
            if next == '"' || next == '\'' {
                current.push(next);
            } else {
                current.push('\\');
                current.push(next);
            }
            has_current = true;
            i += 2;
            continue;
        }

        if in_single {
            if c == '\'' {
                in_single = false;
            } else {
                current.push(c);
            }
            has_current = true;
            i += 1;
            continue;
        }
        if in_double {
            if c == '"' {
                in_double = false;
            } else {
                current.push(c);
            }
            has_current = true;
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_double = true;
                has_current = true;
                i += 1;
            }
            '\'' => {
                in_single = true;
                has_current = true;
                i += 1;
            }
            c if c.is_whitespace() => {
                if has_current {
                    tokens.push(std::mem::take(&mut current));
                    has_current = false;
                }
                i += 1;
            }
            '>' | '<' => {
                if has_current {
                    tokens.push(std::mem::take(&mut current));
                    has_current = false;
                }
                if c == '>' && chars.get(i + 1) == Some(&'>') {
                    tokens.push(">>".to_string());
                    i += 2;
                } else {
                    tokens.push(c.to_string());
                    i += 1;
                }
            }
            _ => {
                current.push(c);
                has_current = true;
                i += 1;
            }
        }
    }

    if in_single || in_double {
        return Err(ParseError::UnterminatedQuote);
    }
    if has_current {
        tokens.push(current);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_sequence() {
        let (segs, ops, bg) = split_chain("echo a; echo b").unwrap();
        assert_eq!(segs, vec!["echo a", "echo b"]);
        assert_eq!(ops, vec![OperatorType::Sequence]);
        assert!(!bg);
    }

    #[test]
    fn recognizes_and_or_before_single_char() {
        let (segs, ops, _) = split_chain("true && echo yes || echo no").unwrap();
        assert_eq!(segs, vec!["true", "echo yes", "echo no"]);
        assert_eq!(ops, vec![OperatorType::And, OperatorType::Or]);
    }

    #[test]
    fn operators_inside_quotes_are_literal() {
        let (segs, ops, _) = split_chain("echo \"operators && inside quotes\"").unwrap();
        assert_eq!(segs.len(), 1);
        assert!(ops.is_empty());
        assert_eq!(segs[0], "echo \"operators && inside quotes\"");
    }

    #[test]
    fn unterminated_quote_is_error() {
        let err = split_chain("echo \"oops").unwrap_err();
        assert_eq!(err, ParseError::UnterminatedQuote);
    }

    #[test]
    fn trailing_background_flag() {
        let (segs, ops, bg) = split_chain("sleep 5 &").unwrap();
        assert_eq!(segs, vec!["sleep 5"]);
        assert!(ops.is_empty());
        assert!(bg);
    }

    #[test]
    fn background_between_commands() {
        let (segs, ops, bg) = split_chain("sleep 5 & echo done").unwrap();
        assert_eq!(segs, vec!["sleep 5", "echo done"]);
        assert_eq!(ops, vec![OperatorType::Background]);
        assert!(!bg);
    }

    #[test]
    fn tokenizes_redirects() {
        let cmd = tokenize_command("grep foo > out.txt").unwrap();
        assert_eq!(cmd.name, "grep");
        assert_eq!(cmd.args, vec!["foo"]);
        assert_eq!(cmd.redirects.get(">"), Some(&"out.txt".to_string()));
    }

    #[test]
    fn tokenizes_append_redirect() {
        let cmd = tokenize_command("echo hi >> out.txt").unwrap();
        assert_eq!(cmd.redirects.get(">>"), Some(&"out.txt".to_string()));
    }

    #[test]
    fn invalid_redirect_errors() {
        let err = tokenize_command("echo hi >").unwrap_err();
        assert_eq!(err, ParseError::InvalidRedirect(">".to_string()));
    }

    #[test]
    fn backslash_preserves_windows_path() {
        let cmd = tokenize_command("cat C:\\Users\\x").unwrap();
        assert_eq!(cmd.args, vec!["C:\\Users\\x"]);
    }

    #[test]
    fn backslash_escapes_quote() {
        let cmd = tokenize_command("echo don\\'t").unwrap();
        assert_eq!(cmd.args, vec!["don't"]);
    }
}
