//! Bash-style bang-history expansion: `!!`, `!N`, `!prefix`.
//!
//! Runs once per input line, before variable expansion (§4.2). Expansion is
//! non-idempotent by design: `!!` resolves differently depending on the
//! history state at call time, but deterministic given a fixed history.

use crate::errors::HistoryError;

/// Expand history references in `input` against `history` (oldest first,
/// not yet including `input` itself — the caller appends after execution).
///
/// Returns the expanded line unchanged if it contains no `!` references.
pub fn expand(input: &str, history: &[String]) -> Result<String, HistoryError> {
    if !input.contains('!') {
        return Ok(input.to_string());
    }

    // Only full-line forms are specified (`!!`, `!N`, `!prefix`), matched at
    // the start of a whitespace-delimited word.
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    let mut word_start = true;

    while let Some((idx, c)) = chars.next() {
        if c == '!' && word_start {
            let rest = &input[idx + 1..];
            if let Some(expansion) = resolve(rest, history)? {
                out.push_str(&expansion.replacement);
                // Skip the consumed characters of `rest`.
                for _ in 0..expansion.consumed {
                    chars.next();
                }
                word_start = false;
                continue;
            }
        }
        out.push(c);
        word_start = c.is_whitespace();
    }

    Ok(out)
}

struct Resolved {
    replacement: String,
    consumed: usize,
}

fn resolve(rest: &str, history: &[String]) -> Result<Option<Resolved>, HistoryError> {
    if let Some(stripped) = rest.strip_prefix('!') {
        let _ = stripped;
        let last = history
            .last()
            .cloned()
            .ok_or(HistoryError::NotFoundIndex(0))?;
        return Ok(Some(Resolved {
            replacement: last,
            consumed: 1,
        }));
    }

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty() {
        let n: usize = digits.parse().unwrap_or(0);
        if n == 0 || n > history.len() {
            return Err(HistoryError::NotFoundIndex(n));
        }
        return Ok(Some(Resolved {
            replacement: history[n - 1].clone(),
            consumed: digits.len(),
        }));
    }

    let prefix: String = rest
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect();
    if prefix.is_empty() {
        return Ok(None);
    }
    match history.iter().rev().find(|h| h.starts_with(&prefix)) {
        Some(found) => Ok(Some(Resolved {
            replacement: found.clone(),
            consumed: prefix.len(),
        })),
        None => Err(HistoryError::NotFoundPrefix(prefix)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bang_bang_expands_last_entry() {
        let history = vec!["echo first".to_string(), "echo second".to_string()];
        let expanded = expand("!!", &history).unwrap();
        assert_eq!(expanded, "echo second");
    }

    #[test]
    fn bang_index_is_one_indexed() {
        let history = vec!["echo first".to_string(), "echo second".to_string()];
        assert_eq!(expand("!1", &history).unwrap(), "echo first");
        assert_eq!(expand("!2", &history).unwrap(), "echo second");
    }

    #[test]
    fn bang_prefix_finds_most_recent_match() {
        let history = vec!["echo one".to_string(), "echo two".to_string()];
        assert_eq!(expand("!echo", &history).unwrap(), "echo two");
    }

    #[test]
    fn missing_index_errors() {
        let history = vec!["echo one".to_string()];
        let err = expand("!5", &history).unwrap_err();
        assert_eq!(err, HistoryError::NotFoundIndex(5));
    }

    #[test]
    fn missing_prefix_errors() {
        let history = vec!["echo one".to_string()];
        let err = expand("!nope", &history).unwrap_err();
        assert_eq!(err, HistoryError::NotFoundPrefix("nope".to_string()));
    }

    #[test]
    fn no_bang_is_passthrough() {
        assert_eq!(expand("echo hi", &[]).unwrap(), "echo hi");
    }
}
