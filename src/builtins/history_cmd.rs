//! History built-in: `history [N]` (§4.6).

use super::{usage_error, Builtin};
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;

pub struct HistoryCommand;

#[async_trait]
impl Builtin for HistoryCommand {
    fn name(&self) -> &'static str {
        "history"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let entries = session.history.entries();

        let limit = match args.first() {
            None => entries.len(),
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) => n,
                Err(_) => return usage_error("history", format!("{raw}: not a number")),
            },
        };

        let start = entries.len().saturating_sub(limit);
        let offset = start + 1;
        let listing = entries[start..]
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:5}  {}", offset + i, line))
            .collect::<Vec<_>>()
            .join("\n");

        if listing.is_empty() {
            ExecutionResult::ok(String::new())
        } else {
            ExecutionResult::ok(format!("{listing}\n"))
        }
    }
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
    async fn lists_all_entries_numbered() {
        let mut s = session();
        s.history.append("echo a");
        s.history.append("echo b");
        let result = HistoryCommand.execute(&[], &mut s).await;
        assert!(result.output.contains("1  echo a"));
        assert!(result.output.contains("2  echo b"));
    }

    #[tokio::test]
    async fn limits_to_last_n() {
        let mut s = session();
        s.history.append("echo a");
        s.history.append("echo b");
        s.history.append("echo c");
        let result = HistoryCommand
            .execute(&["1".to_string()], &mut s)
            .await;
        assert!(!result.output.contains("echo a"));
        assert!(result.output.contains("3  echo c"));
    }
}
