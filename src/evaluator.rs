//! Chain evaluator (§4.4): walks a validated `CommandChain`, dispatching each
//! `Command` to the built-in registry or the external executor, applying
//! operator semantics (`;`, `&&`, `||`, `|`, `&`) and aggregating results.
//!
//! A non-final pipe segment's stdout is moved into the next command's stdin
//! and cleared from its own result before aggregation, so the final
//! aggregate reads like the pipeline's output rather than a concatenation
//! of every stage's stdout.

use crate::builtins::{self, CommandRegistry};
use crate::executor;
use crate::security::Guard;
use crate::session::Session;
use crate::types::{aggregate, Command, CommandChain, ExecutionResult, OperatorType};

/// Execute a parsed, security-checked chain end to end.
///
/// Security is checked here (not by the caller) so every entry point shares
/// the same gate: `Guard::check` is a pure function of `(chain, mode)`.
pub async fn execute_chain(
    chain: &CommandChain,
    session: &mut Session,
    registry: &CommandRegistry,
    guard: &Guard,
) -> ExecutionResult {
    if chain.is_empty() {
        return ExecutionResult::ok(String::new());
    }

    if let Err(violation) = guard.check(chain, session.security_mode) {
        return ExecutionResult::failure(format!("{violation}\n"), 1);
    }

    let mut executed: Vec<ExecutionResult> = Vec::new();
    let mut pipe_stdin: Option<String> = None;
    // The determining exit code for &&/|| decisions, carried forward across
    // skipped commands so cascading short-circuits resolve correctly (e.g.
    // `false && a && b` skips both `a` and `b`, not just `a`).
    let mut last_exit: i32 = 0;
    let mut should_run = true;

    for (i, cmd) in chain.commands.iter().enumerate() {
        let prev_op = i.checked_sub(1).and_then(|j| chain.operators.get(j)).copied();
        if i > 0 {
            should_run = match prev_op {
                None | Some(OperatorType::Sequence) | Some(OperatorType::Pipe) | Some(OperatorType::Background) => true,
                Some(OperatorType::And) => last_exit == 0,
                Some(OperatorType::Or) => last_exit != 0,
            };
        }

        if cmd.name.is_empty() {
            // Synthetic continuation after a trailing `&` (see parser::parse_chain).
            continue;
        }
        if !should_run {
            continue;
        }

        let next_op = chain.operators.get(i).copied();
        let backgrounded = next_op == Some(OperatorType::Background);

        if backgrounded {
            let result = dispatch_background(cmd, session).await;
            last_exit = result.exit_code;
            executed.push(result);
            continue;
        }

        let mut result = dispatch_one(cmd, session, registry, pipe_stdin.take().as_deref()).await;
        last_exit = result.exit_code;

        if next_op == Some(OperatorType::Pipe) {
            pipe_stdin = Some(std::mem::take(&mut result.output));
        }
        executed.push(result);
    }

    aggregate(&executed)
}

async fn dispatch_one(
    cmd: &Command,
    session: &mut Session,
    registry: &CommandRegistry,
    stdin: Option<&str>,
) -> ExecutionResult {
    if let Some(builtin) = registry.get(&cmd.name) {
        return builtins::dispatch(builtin, &cmd.args, session).await;
    }
    executor::execute(cmd, session, stdin).await
}

/// Dispatch `cmd` to the background via the job registry, returning
/// immediately with a shell-style `[id] pid` notification as its output so
/// the chain's aggregated result reflects the dispatch, not the job's
/// eventual completion (§4.4's "chain continues... immediately").
async fn dispatch_background(cmd: &Command, session: &mut Session) -> ExecutionResult {
    match executor::spawn_background(cmd, session).await {
        Ok(started) => ExecutionResult::ok(format!(
            "[{}] {}\n",
            started.id,
            started.pid.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string())
        )),
        Err(result) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_chain;
    use crate::security::SecurityMode;
    use crate::session::{ExecutorMode, SessionOptions};

    fn session_in(dir: &std::path::Path) -> Session {
        Session::new(SessionOptions {
            cwd: Some(dir.to_path_buf()),
            home: Some(dir.to_path_buf()),
            executor_mode: Some(ExecutorMode::Shell),
            ..Default::default()
        })
    }

    async fn run(input: &str, session: &mut Session) -> ExecutionResult {
        let registry = CommandRegistry::new();
        let guard = Guard::new();
        let chain = parse_chain(input, &session.aliases).unwrap();
        execute_chain(&chain, session, &registry, &guard).await
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn and_runs_second_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let result = run("echo test1 && echo test2", &mut session).await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "test1\ntest2\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn or_runs_second_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let result = run("false || echo backup", &mut session).await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "backup\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn and_chain_cascades_skip() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let result = run("false && echo a && echo b", &mut session).await;
        assert_eq!(result.output, "");
        assert_ne!(result.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn quoted_operators_are_one_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let result = run("echo \"operators && inside quotes\"", &mut session).await;
        assert_eq!(result.output, "operators && inside quotes\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn variable_expansion_round_trips_through_set_and_echo() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session
            .variables
            .insert("GREETING".to_string(), "hello".to_string());
        let result = run("echo $GREETING", &mut session).await;
        assert_eq!(result.output, "hello\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn strict_mode_rejects_operator_after_external_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.security_mode = SecurityMode::Strict;
        let result = run("echo hi && rm -rf /", &mut session).await;
        assert_eq!(result.exit_code, 1);
        assert!(result.error.contains("strict mode"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pipe_feeds_captured_stdout_as_stdin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
        let mut session = session_in(dir.path());
        let result = run("cat a.txt | sort", &mut session).await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "one\nthree\ntwo\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn background_dispatch_does_not_block_chain() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let result = run("sleep 1 & echo done", &mut session).await;
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("done"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_chain_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let result = run("   ", &mut session).await;
        assert_eq!(result.exit_code, 0);
        assert!(result.output.is_empty());
    }
}
