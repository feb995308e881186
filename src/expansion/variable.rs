//! Variable and tilde expansion: `${NAME}`, `$NAME`, `%NAME%`, leading `~`.
//!
//! Resolution order for a name: session variables, then a curated whitelist
//! of process environment variables, then empty string (§4.2). Idempotent
//! on inputs free of `$`/`${`/`%` and after a single full pass (no cascade).

use std::collections::HashMap;

const ENV_WHITELIST: &[&str] = &["HOME", "USER", "USERPROFILE", "USERNAME", "PATH"];

/// Expand tilde and variable references in `input`.
///
/// `variables` is the session's variable map; `cwd` binds `PWD` in the
/// whitelist fallback; `home` is used for tilde expansion.
pub fn expand(input: &str, variables: &HashMap<String, String>, cwd: &str, home: &str) -> String {
    let with_tilde = expand_tilde(input, home);
    expand_variables(&with_tilde, variables, cwd)
}

fn expand_tilde(input: &str, home: &str) -> String {
    if input == "~" {
        return home.to_string();
    }
    if let Some(rest) = input.strip_prefix("~/") {
        return format!("{}/{}", home, rest);
    }
    input.to_string()
}

fn resolve_name(name: &str, variables: &HashMap<String, String>, cwd: &str) -> String {
    if let Some(v) = variables.get(name) {
        return v.clone();
    }
    if name == "PWD" {
        return cwd.to_string();
    }
    if ENV_WHITELIST.contains(&name) {
        if let Ok(v) = std::env::var(name) {
            return v;
        }
    }
    String::new()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn expand_variables(input: &str, variables: &HashMap<String, String>, cwd: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(input.len());
    let mut i = 0usize;

    while i < len {
        let c = chars[i];
        if c == '$' && chars.get(i + 1) == Some(&'{') {
            if let Some(end) = find_brace_close(&chars, i + 2) {
                let name: String = chars[i + 2..end].iter().collect();
                out.push_str(&resolve_name(&name, variables, cwd));
                i = end + 1;
                continue;
            }
        } else if c == '$' && chars.get(i + 1).map_or(false, |&n| is_name_start(n)) {
            let start = i + 1;
            let mut end = start;
            while end < len && is_name_char(chars[end]) {
                end += 1;
            }
            let name: String = chars[start..end].iter().collect();
            out.push_str(&resolve_name(&name, variables, cwd));
            i = end;
            continue;
        } else if c == '%' {
            if let Some(end) = find_percent_close(&chars, i + 1) {
                let name: String = chars[i + 1..end].iter().collect();
                if !name.is_empty() && name.chars().all(is_name_char) && is_name_start(name.chars().next().unwrap()) {
                    out.push_str(&resolve_name(&name, variables, cwd));
                    i = end + 1;
                    continue;
                }
            }
        }
        out.push(c);
        i += 1;
    }

    out
}

fn find_brace_close(chars: &[char], start: usize) -> Option<usize> {
    chars[start..].iter().position(|&c| c == '}').map(|p| start + p)
}

fn find_percent_close(chars: &[char], start: usize) -> Option<usize> {
    chars[start..].iter().position(|&c| c == '%').map(|p| start + p)
}
