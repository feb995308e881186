//! External command execution: host-shell delegation (`shell` mode) and the
//! PATH-resolving direct spawn (`internal` mode) (§4.5).
//!
//! Both modes share working-directory, environment, and redirection wiring;
//! they differ only in how the child program and argv are chosen.

use crate::bus::{self, Dispatcher, Message};
use crate::session::{ExecutorMode, Session};
use crate::types::{Command, ExecutionResult};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;

/// Known cross-shell command equivalents, surfaced in `CommandNotFound`
/// suggestions (§4.5). Purely informational — never changes the exit code.
const EQUIVALENTS: &[(&str, &str)] = &[
    ("dir", "ls"),
    ("ls", "dir"),
    ("cls", "clear"),
    ("clear", "cls"),
    ("type", "cat"),
    ("cat", "type"),
    ("copy", "cp"),
    ("cp", "copy"),
    ("move", "mv"),
    ("mv", "move"),
    ("del", "rm"),
    ("rm", "del"),
    ("md", "mkdir"),
    ("mkdir", "md"),
    ("rd", "rmdir"),
    ("rmdir", "rd"),
    ("tasklist", "ps"),
    ("ps", "tasklist"),
    ("findstr", "grep"),
    ("grep", "findstr"),
];

/// Install hints for a small known-package set, appended to `CommandNotFound`.
const INSTALL_HINTS: &[(&str, &str)] = &[
    ("git", "https://git-scm.com/downloads"),
    ("curl", "https://curl.se/download.html"),
    ("wget", "https://www.gnu.org/software/wget/"),
    ("jq", "https://jqlang.github.io/jq/download/"),
    ("python", "https://www.python.org/downloads/"),
    ("node", "https://nodejs.org/"),
    ("docker", "https://docs.docker.com/get-docker/"),
];

/// Run `cmd` to completion (foreground), returning the aggregated result. Pipe
/// input, if any, is fed to the child's stdin.
pub async fn execute(
    cmd: &Command,
    session: &Session,
    stdin: Option<&str>,
) -> ExecutionResult {
    let start = Instant::now();
    let mut builder = match session.executor_mode {
        ExecutorMode::Shell => shell_builder(cmd),
        ExecutorMode::Internal => match internal_builder(cmd, session).await {
            Ok(builder) => builder,
            Err(result) => return result.with_duration(start.elapsed()),
        },
    };

    builder
        .current_dir(&session.cwd)
        .env_clear()
        .envs(session.export_environment());

    let stdin_from_redirect = cmd.redirects.get("<").cloned();
    let has_piped_stdin = stdin.is_some();

    if has_piped_stdin {
        builder.stdin(Stdio::piped());
    } else if let Some(path) = &stdin_from_redirect {
        match std::fs::File::open(session.cwd.join(path)) {
            Ok(file) => {
                builder.stdin(Stdio::from(file));
            }
            Err(e) => {
                return ExecutionResult::failure(format!("{}: {e}\n", cmd.name), 1)
                    .with_duration(start.elapsed());
            }
        }
    } else {
        builder.stdin(Stdio::null());
    }
    builder.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = match builder.spawn() {
        Ok(child) => child,
        Err(e) => {
            bus::emit(
                &session.dispatcher,
                Message::Started {
                    cmd: cmd.joined(),
                    pid: None,
                    err: Some(e.to_string()),
                },
            );
            bus::emit(
                &session.dispatcher,
                Message::Exited {
                    code: 1,
                    err: Some(e.to_string()),
                },
            );
            return ExecutionResult::failure(format!("{}: {e}\n", cmd.name), 1)
                .with_duration(start.elapsed());
        }
    };

    bus::emit(
        &session.dispatcher,
        Message::Started {
            cmd: cmd.joined(),
            pid: child.id(),
            err: None,
        },
    );

    if let (Some(text), Some(mut handle)) = (stdin, child.stdin.take()) {
        let _ = handle.write_all(text.as_bytes()).await;
    }
    drop(child.stdin.take());

    let output = collect_output(&mut child, &session.dispatcher).await;
    let status = child.wait().await;

    let exit_code = match status {
        Ok(status) => status.code().unwrap_or(1),
        Err(_) => 1,
    };

    bus::emit(
        &session.dispatcher,
        Message::Exited {
            code: exit_code,
            err: None,
        },
    );

    if let Some(path) = cmd.redirects.get(">") {
        if let Err(e) = std::fs::write(session.cwd.join(path), &output.stdout) {
            return ExecutionResult::failure(format!("{}: {e}\n", cmd.name), 1)
                .with_duration(start.elapsed());
        }
        return ExecutionResult {
            output: String::new(),
            error: output.stderr,
            exit_code,
            duration: start.elapsed(),
        };
    }
    if let Some(path) = cmd.redirects.get(">>") {
        use std::io::Write;
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(session.cwd.join(path))
            .and_then(|mut f| f.write_all(output.stdout.as_bytes()));
        if let Err(e) = result {
            return ExecutionResult::failure(format!("{}: {e}\n", cmd.name), 1)
                .with_duration(start.elapsed());
        }
        return ExecutionResult {
            output: String::new(),
            error: output.stderr,
            exit_code,
            duration: start.elapsed(),
        };
    }

    ExecutionResult {
        output: output.stdout,
        error: output.stderr,
        exit_code,
        duration: start.elapsed(),
    }
}

/// Spawn `cmd` without awaiting completion, handing the child to the job
/// registry for supervision (§4.7's background dispatch).
pub async fn spawn_background(
    cmd: &Command,
    session: &Session,
) -> Result<crate::jobs::StartedJob, ExecutionResult> {
    let mut builder = match session.executor_mode {
        ExecutorMode::Shell => shell_builder(cmd),
        ExecutorMode::Internal => internal_builder(cmd, session).await?,
    };

    builder
        .current_dir(&session.cwd)
        .env_clear()
        .envs(session.export_environment())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = builder
        .spawn()
        .map_err(|e| ExecutionResult::failure(format!("{}: {e}\n", cmd.name), 1))?;

    Ok(session
        .jobs
        .start(
            child,
            cmd.joined(),
            cmd.args.clone(),
            session.cwd_string(),
            session.export_environment(),
            session.dispatcher.clone(),
        )
        .await)
}

struct CollectedOutput {
    stdout: String,
    stderr: String,
}

async fn collect_output(child: &mut Child, dispatcher: &Option<Dispatcher>) -> CollectedOutput {
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        let _ = stdout.read_to_end(&mut stdout_buf).await;
    }
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_end(&mut stderr_buf).await;
    }
    let stdout = String::from_utf8_lossy(&stdout_buf).to_string();
    let stderr = String::from_utf8_lossy(&stderr_buf).to_string();

    for line in stdout.lines() {
        bus::emit(
            dispatcher,
            Message::Stdout {
                line: line.to_string(),
            },
        );
    }
    for line in stderr.lines() {
        bus::emit(
            dispatcher,
            Message::Stderr {
                line: line.to_string(),
            },
        );
    }

    CollectedOutput { stdout, stderr }
}

fn shell_builder(cmd: &Command) -> tokio::process::Command {
    let line = cmd.joined();
    #[cfg(windows)]
    {
        if let Some(program) = which("pwsh") {
            let mut b = tokio::process::Command::new(program);
            b.args(["-NoLogo", "-NoProfile", "-NonInteractive", "-Command", &line]);
            return b;
        }
        if let Some(program) = which("powershell") {
            let mut b = tokio::process::Command::new(program);
            b.args(["-NoLogo", "-NoProfile", "-NonInteractive", "-Command", &line]);
            return b;
        }
        let mut b = tokio::process::Command::new("cmd");
        b.args(["/C", &line]);
        b
    }
    #[cfg(not(windows))]
    {
        let mut b = tokio::process::Command::new("/bin/sh");
        b.args(["-c", &line]);
        b
    }
}

async fn internal_builder(
    cmd: &Command,
    session: &Session,
) -> Result<tokio::process::Command, ExecutionResult> {
    let resolved = resolve_path(&cmd.name, session)
        .ok_or_else(|| command_not_found(&cmd.name))?;
    let mut builder = tokio::process::Command::new(resolved);
    builder.args(&cmd.args);
    Ok(builder)
}

/// Resolve `name` to an executable path. A name containing a path separator
/// is treated as a literal path; otherwise PATH is searched, honoring
/// PATHEXT on Windows and the executable bit on POSIX.
async fn resolve_path(name: &str, session: &Session) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }

    let path_var = session
        .variables
        .get("PATH")
        .cloned()
        .or_else(|| std::env::var("PATH").ok())
        .unwrap_or_default();

    for dir in std::env::split_paths(&path_var) {
        #[cfg(windows)]
        {
            let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT".to_string());
            for ext in pathext.split(';') {
                let candidate = dir.join(format!("{name}{ext}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
            let bare = dir.join(name);
            if bare.is_file() {
                return Some(bare);
            }
        }
        #[cfg(not(windows))]
        {
            let candidate = dir.join(name);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

fn is_executable(path: &PathBuf) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

#[cfg(windows)]
fn which(program: &str) -> Option<String> {
    let path_var = std::env::var("PATH").ok()?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(format!("{program}.exe"));
        if candidate.is_file() {
            return Some(program.to_string());
        }
    }
    None
}

fn command_not_found(name: &str) -> ExecutionResult {
    let mut message = format!("{name}: command not found\n");

    let mut suggestions: Vec<&str> = EQUIVALENTS
        .iter()
        .filter(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .collect();
    suggestions.dedup();
    if !suggestions.is_empty() {
        message.push_str(&format!("did you mean: {}\n", suggestions.join(", ")));
    }

    if let Some((_, hint)) = INSTALL_HINTS.iter().find(|(pkg, _)| *pkg == name) {
        message.push_str(&format!("install {name}: {hint}\n"));
    }

    ExecutionResult::failure(message, 127)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;
    use crate::types::Command;

    fn session_in(dir: &std::path::Path, mode: ExecutorMode) -> Session {
        Session::new(SessionOptions {
            cwd: Some(dir.to_path_buf()),
            home: Some(dir.to_path_buf()),
            executor_mode: Some(mode),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn shell_mode_runs_echo() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path(), ExecutorMode::Shell);
        let cmd = Command::new("echo", vec!["hi".to_string()]);
        let result = execute(&cmd, &session, None).await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output.trim(), "hi");
    }

    #[tokio::test]
    async fn internal_mode_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), ExecutorMode::Internal);
        session
            .variables
            .insert("PATH".to_string(), "/does/not/exist".to_string());
        let cmd = Command::new("definitely-not-a-real-binary", Vec::new());
        let result = execute(&cmd, &session, None).await;
        assert_eq!(result.exit_code, 127);
        assert!(result.error.contains("command not found"));
    }

    #[tokio::test]
    async fn internal_mode_resolves_via_path() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path(), ExecutorMode::Internal);
        let cmd = Command::new("echo", vec!["hey".to_string()]);
        let result = execute(&cmd, &session, None).await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output.trim(), "hey");
    }

    #[tokio::test]
    async fn redirect_to_file_writes_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path(), ExecutorMode::Shell);
        let mut cmd = Command::new("echo", vec!["redirected".to_string()]);
        cmd.redirects
            .insert(">".to_string(), "out.txt".to_string());
        let result = execute(&cmd, &session, None).await;
        assert_eq!(result.exit_code, 0);
        let content = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(content.trim(), "redirected");
    }

    #[tokio::test]
    async fn piped_stdin_feeds_child() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path(), ExecutorMode::Shell);
        let cmd = Command::new("cat", Vec::new());
        let result = execute(&cmd, &session, Some("piped text\n")).await;
        assert_eq!(result.output, "piped text\n");
    }
}
