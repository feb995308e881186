//! System-information built-ins: `ps`, `kill`/`taskkill`, `df`, `uptime`,
//! `whoami`, `systeminfo`, `ping` (§4.6).
//!
//! These shell out to the host's own system utilities rather than
//! reimplementing `/proc` parsing or WMI queries, the same "delegate to the
//! platform" posture the external executor uses for ordinary commands.

use super::{usage_error, Builtin};
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;
use tokio::process::Command;

async fn run(program: &str, args: &[&str]) -> ExecutionResult {
    match Command::new(program).args(args).output().await {
        Ok(output) => {
            let code = output.status.code().unwrap_or(1);
            if output.status.success() {
                ExecutionResult::ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                ExecutionResult::failure(String::from_utf8_lossy(&output.stderr).to_string(), code)
            }
        }
        Err(e) => usage_error(program, format!("failed to run: {e}")),
    }
}

pub struct PsCommand;

#[async_trait]
impl Builtin for PsCommand {
    fn name(&self) -> &'static str {
        "ps"
    }

    async fn execute(&self, _args: &[String], _session: &mut Session) -> ExecutionResult {
        if cfg!(windows) {
            run("tasklist", &[]).await
        } else {
            run("ps", &["aux"]).await
        }
    }
}

/// `kill -9 PID` / `taskkill /F /PID PID` style process termination, distinct
/// from the jobs-module `kill` built-in which resolves job refs.
pub struct KillProcCommand;

#[async_trait]
impl Builtin for KillProcCommand {
    fn name(&self) -> &'static str {
        "taskkill"
    }

    async fn execute(&self, args: &[String], _session: &mut Session) -> ExecutionResult {
        let force = args.iter().any(|a| a == "-9" || a == "-KILL" || a == "/F");
        let pid = match args.iter().find(|a| a.parse::<u32>().is_ok()) {
            Some(p) => p.clone(),
            None => return usage_error("taskkill", "usage: taskkill [-9] PID"),
        };

        if cfg!(windows) {
            let mut flags = vec!["/PID".to_string(), pid];
            if force {
                flags.push("/F".to_string());
            }
            let flag_refs: Vec<&str> = flags.iter().map(String::as_str).collect();
            run("taskkill", &flag_refs).await
        } else {
            let signal = if force { "-KILL" } else { "-TERM" };
            run("kill", &[signal, &pid]).await
        }
    }
}

pub struct DfCommand;

#[async_trait]
impl Builtin for DfCommand {
    fn name(&self) -> &'static str {
        "df"
    }

    async fn execute(&self, _args: &[String], _session: &mut Session) -> ExecutionResult {
        if cfg!(windows) {
            run("wmic", &["logicaldisk", "get", "size,freespace,caption"]).await
        } else {
            run("df", &["-h"]).await
        }
    }
}

pub struct UptimeCommand;

#[async_trait]
impl Builtin for UptimeCommand {
    fn name(&self) -> &'static str {
        "uptime"
    }

    async fn execute(&self, _args: &[String], _session: &mut Session) -> ExecutionResult {
        if cfg!(windows) {
            run("net", &["stats", "srv"]).await
        } else {
            run("uptime", &[]).await
        }
    }
}

pub struct WhoamiCommand;

#[async_trait]
impl Builtin for WhoamiCommand {
    fn name(&self) -> &'static str {
        "whoami"
    }

    async fn execute(&self, _args: &[String], _session: &mut Session) -> ExecutionResult {
        run("whoami", &[]).await
    }
}

pub struct SysteminfoCommand;

#[async_trait]
impl Builtin for SysteminfoCommand {
    fn name(&self) -> &'static str {
        "systeminfo"
    }

    async fn execute(&self, _args: &[String], _session: &mut Session) -> ExecutionResult {
        if cfg!(windows) {
            run("systeminfo", &[]).await
        } else {
            run("uname", &["-a"]).await
        }
    }
}

pub struct PingCommand;

#[async_trait]
impl Builtin for PingCommand {
    fn name(&self) -> &'static str {
        "ping"
    }

    async fn execute(&self, args: &[String], _session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            return usage_error("ping", "usage: ping HOST [-c N]");
        }
        let count = args
            .iter()
            .position(|a| a == "-c")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_else(|| "4".to_string());
        let host = args
            .iter()
            .find(|a| !a.starts_with('-') && a.parse::<u32>().is_err())
            .cloned();
        let Some(host) = host else {
            return usage_error("ping", "usage: ping HOST [-c N]");
        };

        if cfg!(windows) {
            run("ping", &["-n", &count, &host]).await
        } else {
            run("ping", &["-c", &count, &host]).await
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
    async fn ping_requires_a_host() {
        let mut s = session();
        let result = PingCommand.execute(&[], &mut s).await;
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn taskkill_requires_a_pid() {
        let mut s = session();
        let result = KillProcCommand.execute(&[], &mut s).await;
        assert_eq!(result.exit_code, 1);
    }
}
