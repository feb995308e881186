//! Miscellaneous built-ins: `:secure`, `help`, `exit` (§4.6).

use super::{usage_error, Builtin};
use crate::security::SecurityMode;
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;

pub struct SecureCommand;

#[async_trait]
impl Builtin for SecureCommand {
    fn name(&self) -> &'static str {
        ":secure"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        match args.first() {
            None => ExecutionResult::ok(format!("{}\n", session.security_mode.as_str())),
            Some(raw) => match SecurityMode::parse(raw) {
                Some(mode) => {
                    session.security_mode = mode;
                    ExecutionResult::ok(format!("{}\n", mode.as_str()))
                }
                None => usage_error(":secure", format!("{raw}: must be 'strict' or 'permissive'")),
            },
        }
    }
}

pub struct HelpCommand;

const HELP_TEXT: &str = "\
Built-in commands:
  cd, pwd, home, clear           navigation
  set, unset, export, env        variables
  alias, unalias                 aliases
  history [N]                    command history
  jobs, fg, bg, disown, suspend, kill   job control
  :secure [strict|permissive]    security mode
  exit [code]                    leave the shell
  ls, mkdir, rm, cp, mv, cat, touch, grep, sort, wc, head, tail, find
                                  file operations
  ps, kill, df, uptime, whoami, systeminfo, ping
                                  system information
";

#[async_trait]
impl Builtin for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn execute(&self, _args: &[String], _session: &mut Session) -> ExecutionResult {
        ExecutionResult::ok(HELP_TEXT)
    }
}

pub struct ExitCommand;

#[async_trait]
impl Builtin for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let code = match args.first() {
            None => 0,
            Some(raw) => match raw.parse::<i32>() {
                Ok(n) => n,
                Err(_) => return usage_error("exit", format!("{raw}: not a number")),
            },
        };
        session.exit_requested = Some(code);
        ExecutionResult {
            output: String::new(),
            error: String::new(),
            exit_code: code,
            duration: std::time::Duration::ZERO,
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
    async fn secure_no_args_prints_current_mode() {
        let mut s = session();
        let result = SecureCommand.execute(&[], &mut s).await;
        assert_eq!(result.output, "permissive\n");
    }

    #[tokio::test]
    async fn secure_switches_mode() {
        let mut s = session();
        SecureCommand
            .execute(&["strict".to_string()], &mut s)
            .await;
        assert_eq!(s.security_mode, SecurityMode::Strict);
    }

    #[tokio::test]
    async fn exit_parses_code() {
        let mut s = session();
        let result = ExitCommand.execute(&["3".to_string()], &mut s).await;
        assert_eq!(result.exit_code, 3);
        assert_eq!(s.exit_requested, Some(3));
    }
}
