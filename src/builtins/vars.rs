//! Variable built-ins: `set`, `unset`, `export`, `env` (§4.6).

use super::{usage_error, Builtin};
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;

pub struct SetCommand;

#[async_trait]
impl Builtin for SetCommand {
    fn name(&self) -> &'static str {
        "set"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            let mut pairs: Vec<(&String, &String)> = session.variables.iter().collect();
            pairs.sort_by_key(|(k, _)| k.clone());
            let listing = pairs
                .into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("\n");
            return ExecutionResult::ok(format!("{listing}\n"));
        }

        let (name, value) = match parse_assignment(args) {
            Some(pair) => pair,
            None => return usage_error("set", "usage: set NAME VALUE | set NAME=VALUE"),
        };

        session.variables.insert(name, value);
        ExecutionResult::ok(String::new())
    }
}

pub struct UnsetCommand;

#[async_trait]
impl Builtin for UnsetCommand {
    fn name(&self) -> &'static str {
        "unset"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            return usage_error("unset", "usage: unset NAME...");
        }
        for name in args {
            session.variables.remove(name);
        }
        ExecutionResult::ok(String::new())
    }
}

pub struct ExportCommand;

#[async_trait]
impl Builtin for ExportCommand {
    fn name(&self) -> &'static str {
        "export"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            let mut pairs: Vec<(&String, &String)> = session.variables.iter().collect();
            pairs.sort_by_key(|(k, _)| k.clone());
            let listing = pairs
                .into_iter()
                .map(|(k, v)| format!("export {k}={v}"))
                .collect::<Vec<_>>()
                .join("\n");
            return ExecutionResult::ok(format!("{listing}\n"));
        }

        let (name, value) = match parse_assignment(args) {
            Some(pair) => pair,
            None => return usage_error("export", "usage: export NAME=VALUE"),
        };

        std::env::set_var(&name, &value);
        session.variables.insert(name, value);
        ExecutionResult::ok(String::new())
    }
}

pub struct EnvCommand;

#[async_trait]
impl Builtin for EnvCommand {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn execute(&self, _args: &[String], session: &mut Session) -> ExecutionResult {
        let mut merged = session.variables.clone();
        for (k, v) in std::env::vars() {
            merged.entry(k).or_insert(v);
        }
        let mut pairs: Vec<(String, String)> = merged.into_iter().collect();
        pairs.sort_by_key(|(k, _)| k.clone());
        let listing = pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");
        ExecutionResult::ok(format!("{listing}\n"))
    }
}

/// Accepts either `NAME VALUE` (two args) or `NAME=VALUE` (one arg).
fn parse_assignment(args: &[String]) -> Option<(String, String)> {
    if args.len() == 1 {
        let (name, value) = args[0].split_once('=')?;
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), value.to_string()))
    } else if args.len() >= 2 {
        Some((args[0].clone(), args[1..].join(" ")))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;

    fn session() -> Session {
        let dir = tempfile::tempdir().unwrap();
        let mut s = Session::new(SessionOptions {
            cwd: Some(dir.path().to_path_buf()),
            home: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        s.variables.clear();
        s
    }

    #[tokio::test]
    async fn set_equals_form() {
        let mut s = session();
        SetCommand
            .execute(&["FOO=bar".to_string()], &mut s)
            .await;
        assert_eq!(s.variables.get("FOO"), Some(&"bar".to_string()));
    }

    #[tokio::test]
    async fn set_two_arg_form() {
        let mut s = session();
        SetCommand
            .execute(&["FOO".to_string(), "bar".to_string()], &mut s)
            .await;
        assert_eq!(s.variables.get("FOO"), Some(&"bar".to_string()));
    }

    #[tokio::test]
    async fn unset_removes() {
        let mut s = session();
        s.variables.insert("FOO".to_string(), "bar".to_string());
        UnsetCommand
            .execute(&["FOO".to_string()], &mut s)
            .await;
        assert!(!s.variables.contains_key("FOO"));
    }

    #[tokio::test]
    async fn export_lists_with_prefix_when_no_args() {
        let mut s = session();
        s.variables.insert("FOO".to_string(), "bar".to_string());
        let result = ExportCommand.execute(&[], &mut s).await;
        assert!(result.output.contains("export FOO=bar"));
    }
}
