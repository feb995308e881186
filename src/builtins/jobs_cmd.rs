//! Job-control built-ins: `jobs`, `fg`, `bg`, `disown`, `suspend`, `kill` (§4.6).
//!
//! Job refs follow the usual shell shorthand: `%+`/`%%` the current (highest
//! id) job, `%-` the previous, `%N` an exact id, `%prefix` the most recently
//! started job whose command starts with `prefix`. A bare integer is treated
//! as a raw PID, which `kill` refuses in strict mode (§4.2).

use super::{usage_error, Builtin};
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;

pub struct JobsCommand;

#[async_trait]
impl Builtin for JobsCommand {
    fn name(&self) -> &'static str {
        "jobs"
    }

    async fn execute(&self, _args: &[String], session: &mut Session) -> ExecutionResult {
        let jobs = session.jobs.list().await;
        if jobs.is_empty() {
            return ExecutionResult::ok(String::new());
        }
        let listing = jobs
            .iter()
            .map(|j| {
                format!(
                    "[{}] {:?} {} (pid {})",
                    j.id,
                    j.state,
                    j.command,
                    j.pid.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        ExecutionResult::ok(format!("{listing}\n"))
    }
}

/// Resolve a job-ref argument (`%+`, `%-`, `%N`, `%prefix`, or a raw id) to a
/// job id. Returns `Err` with a descriptive message on failure.
async fn resolve_ref(session: &Session, raw: &str) -> Result<u64, String> {
    let spec = raw.strip_prefix('%').unwrap_or(raw);

    if spec == "+" || spec == "%" || spec.is_empty() {
        return session
            .jobs
            .highest_id()
            .await
            .ok_or_else(|| "no current job".to_string());
    }
    if spec == "-" {
        return session
            .jobs
            .second_highest_id()
            .await
            .ok_or_else(|| "no previous job".to_string());
    }
    if let Ok(id) = spec.parse::<u64>() {
        if session.jobs.get(id).await.is_some() {
            return Ok(id);
        }
        return Err(format!("%{id}: no such job"));
    }
    session
        .jobs
        .find_by_prefix(spec)
        .await
        .ok_or_else(|| format!("{spec}: no such job"))
}

pub struct FgCommand;

#[async_trait]
impl Builtin for FgCommand {
    fn name(&self) -> &'static str {
        "fg"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let raw = args.first().map(String::as_str).unwrap_or("%+");
        let id = match resolve_ref(session, raw).await {
            Ok(id) => id,
            Err(message) => return usage_error("fg", message),
        };
        if let Err(message) = session.jobs.resume(id).await {
            // Already running is not an error for `fg`; only propagate real failures.
            if message != "not running" {
                return usage_error("fg", message);
            }
        }
        match session.jobs.wait(id, None).await {
            Ok(job) => ExecutionResult::ok(format!(
                "[{}] done ({:?})\n",
                job.id, job.state
            )),
            Err(message) => usage_error("fg", message),
        }
    }
}

pub struct BgCommand;

#[async_trait]
impl Builtin for BgCommand {
    fn name(&self) -> &'static str {
        "bg"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let raw = args.first().map(String::as_str).unwrap_or("%+");
        let id = match resolve_ref(session, raw).await {
            Ok(id) => id,
            Err(message) => return usage_error("bg", message),
        };
        match session.jobs.resume(id).await {
            Ok(()) => ExecutionResult::ok(format!("[{id}] resumed in background\n")),
            Err(message) => usage_error("bg", message),
        }
    }
}

pub struct DisownCommand;

#[async_trait]
impl Builtin for DisownCommand {
    fn name(&self) -> &'static str {
        "disown"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let raw = args.first().map(String::as_str).unwrap_or("%+");
        let id = match resolve_ref(session, raw).await {
            Ok(id) => id,
            Err(message) => return usage_error("disown", message),
        };
        match session.jobs.disown(id).await {
            Ok(()) => ExecutionResult::ok(String::new()),
            Err(message) => usage_error("disown", message),
        }
    }
}

pub struct SuspendCommand;

#[async_trait]
impl Builtin for SuspendCommand {
    fn name(&self) -> &'static str {
        "suspend"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let raw = args.first().map(String::as_str).unwrap_or("%+");
        let id = match resolve_ref(session, raw).await {
            Ok(id) => id,
            Err(message) => return usage_error("suspend", message),
        };
        match session.jobs.suspend(id).await {
            Ok(()) => ExecutionResult::ok(format!("[{id}] suspended\n")),
            Err(message) => usage_error("suspend", message),
        }
    }
}

pub struct KillCommand;

#[async_trait]
impl Builtin for KillCommand {
    fn name(&self) -> &'static str {
        "kill"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let force = args
            .iter()
            .any(|a| a == "-9" || a == "-KILL" || a == "-SIGKILL" || a == "/F");
        let targets: Vec<&String> = args
            .iter()
            .filter(|a| !a.starts_with('-') && a.as_str() != "/F")
            .collect();
        if targets.is_empty() {
            return usage_error("kill", "usage: kill [-9] %JOB | kill [-9] PID");
        }

        let mut errors = Vec::new();
        for raw in targets {
            if !raw.starts_with('%') {
                if session.security_mode == crate::security::SecurityMode::Strict {
                    errors.push(format!("{raw}: raw PIDs are disallowed in strict mode"));
                    continue;
                }
                if let Ok(pid) = raw.parse::<u32>() {
                    let result = if force {
                        crate::jobs::signals::kill_force(pid)
                    } else {
                        crate::jobs::signals::kill_graceful(pid)
                    };
                    if let Err(e) = result {
                        errors.push(e.to_string());
                    }
                    continue;
                }
                errors.push(format!("{raw}: not a pid or job ref"));
                continue;
            }

            let id = match resolve_ref(session, raw).await {
                Ok(id) => id,
                Err(message) => {
                    errors.push(message);
                    continue;
                }
            };
            if let Err(message) = session.jobs.kill(id).await {
                errors.push(message);
            }
        }

        if errors.is_empty() {
            ExecutionResult::ok(String::new())
        } else {
            ExecutionResult::failure(errors.join("\n") + "\n", 1)
        }
    }
}
