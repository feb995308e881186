//! Alias built-ins: `alias`, `unalias` (§4.6).

use super::{usage_error, Builtin};
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;

pub struct AliasCommand;

#[async_trait]
impl Builtin for AliasCommand {
    fn name(&self) -> &'static str {
        "alias"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            let mut pairs: Vec<(&String, &String)> = session.aliases.iter().collect();
            pairs.sort_by_key(|(k, _)| k.clone());
            let listing = pairs
                .into_iter()
                .map(|(k, v)| format!("alias {k}='{v}'"))
                .collect::<Vec<_>>()
                .join("\n");
            return ExecutionResult::ok(format!("{listing}\n"));
        }

        if args.len() == 1 {
            if let Some((name, value)) = args[0].split_once('=') {
                session
                    .aliases
                    .insert(name.to_string(), value.to_string());
                return ExecutionResult::ok(String::new());
            }
            return match session.aliases.get(&args[0]) {
                Some(value) => ExecutionResult::ok(format!("alias {}='{}'\n", args[0], value)),
                None => usage_error("alias", format!("{}: not found", args[0])),
            };
        }

        let name = args[0].clone();
        let value = args[1..].join(" ");
        session.aliases.insert(name, value);
        ExecutionResult::ok(String::new())
    }
}

pub struct UnaliasCommand;

#[async_trait]
impl Builtin for UnaliasCommand {
    fn name(&self) -> &'static str {
        "unalias"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            return usage_error("unalias", "usage: unalias NAME...");
        }

        for name in args {
            if session.aliases.remove(name).is_none() {
                let suggestion = nearest_alias(name, session.aliases.keys());
                return match suggestion {
                    Some(close) => usage_error(
                        "unalias",
                        format!("{name}: not found (did you mean '{close}'?)"),
                    ),
                    None => usage_error("unalias", format!("{name}: not found")),
                };
            }
        }
        ExecutionResult::ok(String::new())
    }
}

/// Suggest an existing alias name within edit distance 1 of `name`.
fn nearest_alias<'a>(name: &str, candidates: impl Iterator<Item = &'a String>) -> Option<&'a str> {
    candidates
        .map(|c| c.as_str())
        .find(|c| levenshtein_le_one(name, c))
}

fn levenshtein_le_one(a: &str, b: &str) -> bool {
    if a == b {
        return false;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > 1 {
        return false;
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if shorter.len() == longer.len() {
        let diffs = shorter.iter().zip(longer.iter()).filter(|(x, y)| x != y).count();
        return diffs == 1;
    }

    // lengths differ by exactly one: check for a single insertion/deletion
    let mut i = 0;
    let mut j = 0;
    let mut skipped = false;
    while i < shorter.len() && j < longer.len() {
        if shorter[i] == longer[j] {
            i += 1;
            j += 1;
        } else if !skipped {
            skipped = true;
            j += 1;
        } else {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;

    fn session() -> Session {
        let dir = tempfile::tempdir().unwrap();
        Session::new(SessionOptions {
            cwd: Some(dir.path().to_path_buf()),
            home: Some(dir.path().to_path_buf()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn alias_equals_form() {
        let mut s = session();
        AliasCommand
            .execute(&["ll=ls -la".to_string()], &mut s)
            .await;
        assert_eq!(s.aliases.get("ll"), Some(&"ls -la".to_string()));
    }

    #[tokio::test]
    async fn alias_space_form() {
        let mut s = session();
        AliasCommand
            .execute(&["ll".to_string(), "ls".to_string(), "-la".to_string()], &mut s)
            .await;
        assert_eq!(s.aliases.get("ll"), Some(&"ls -la".to_string()));
    }

    #[tokio::test]
    async fn unalias_unknown_suggests_close_name() {
        let mut s = session();
        s.aliases.insert("ll".to_string(), "ls -la".to_string());
        let result = UnaliasCommand.execute(&["lll".to_string()], &mut s).await;
        assert!(result.error.contains("ll"));
    }
}
