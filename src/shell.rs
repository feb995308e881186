//! `Shell`: the top-level orchestration object a front end (CLI or an
//! embedder) drives one line at a time, ties a `Session` to the parser,
//! guard and registry, and executes one command chain per call (§6).

use crate::builtins::CommandRegistry;
use crate::errors::ShellError;
use crate::expansion::{history as history_expansion, variable as variable_expansion};
use crate::parser::parse_chain;
use crate::security::Guard;
use crate::session::{Session, SessionOptions};
use crate::types::ExecutionResult;
use crate::evaluator;

/// Ties a `Session` to the parser, guard and registry it needs on every
/// line. One `Shell` per process/connection; cheap to construct.
pub struct Shell {
    pub session: Session,
    registry: CommandRegistry,
    guard: Guard,
}

impl Shell {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            session: Session::new(options),
            registry: CommandRegistry::new(),
            guard: Guard::new(),
        }
    }

    /// Run one line through the full pipeline (§4.2→§4.7): bang-history
    /// expansion, then variable/tilde expansion, then parse, then security
    /// check + evaluation, then history append. The *expanded* form is what
    /// gets recorded, never the raw input (§4.2, §4.8).
    pub async fn execute_line(&mut self, line: &str) -> ExecutionResult {
        let history_expanded = match history_expansion::expand(line, self.session.history.entries())
        {
            Ok(expanded) => expanded,
            Err(err) => {
                let err = ShellError::from(err);
                return ExecutionResult::failure(format!("{err}\n"), err.exit_code());
            }
        };

        let expanded = variable_expansion::expand(
            &history_expanded,
            &self.session.variables,
            &self.session.cwd_string(),
            &self.session.home.display().to_string(),
        );

        if expanded.trim().is_empty() {
            return ExecutionResult::ok(String::new());
        }

        let chain = match parse_chain(&expanded, &self.session.aliases) {
            Ok(chain) => chain,
            Err(err) => {
                self.session.history.append(&expanded);
                let shell_err = ShellError::from(err);
                return ExecutionResult::failure(format!("{shell_err}\n"), shell_err.exit_code());
            }
        };

        self.session.history.append(&expanded);
        evaluator::execute_chain(&chain, &mut self.session, &self.registry, &self.guard).await
    }

    pub async fn shutdown(&self) {
        self.session.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ExecutorMode;

    fn shell_in(dir: &std::path::Path) -> Shell {
        Shell::new(SessionOptions {
            cwd: Some(dir.to_path_buf()),
            home: Some(dir.to_path_buf()),
            executor_mode: Some(ExecutorMode::Shell),
            ..Default::default()
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn executes_simple_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell_in(dir.path());
        let result = shell.execute_line("echo hello").await;
        assert_eq!(result.output, "hello\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn records_expanded_form_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell_in(dir.path());
        shell.session.variables.insert("NAME".to_string(), "world".to_string());
        shell.execute_line("echo $NAME").await;
        assert_eq!(shell.session.history.entries(), &["echo world"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bang_bang_reruns_last_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell_in(dir.path());
        shell.execute_line("echo first").await;
        let result = shell.execute_line("!!").await;
        assert_eq!(result.output, "first\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_line_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell_in(dir.path());
        let result = shell.execute_line("   ").await;
        assert_eq!(result.exit_code, 0);
        assert!(shell.session.history.entries().is_empty());
    }
}
