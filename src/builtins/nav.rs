//! Navigation/env built-ins: `cd`, `pwd`, `home`, `clear` (§4.6).

use super::{usage_error, Builtin};
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;
use std::path::PathBuf;

pub struct CdCommand;

#[async_trait]
impl Builtin for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let target = match args.first().map(String::as_str) {
            None => session.home.clone(),
            Some("-") => match session.variables.get("OLDPWD") {
                Some(old) => PathBuf::from(old),
                None => return usage_error("cd", "OLDPWD not set"),
            },
            Some("~") => session.home.clone(),
            Some(p) if p.starts_with("~/") => session.home.join(&p[2..]),
            Some(p) => resolve(&session.cwd, p),
        };

        if !target.is_dir() {
            return usage_error("cd", format!("{}: not a directory", target.display()));
        }

        let old = session.cwd_string();
        session.cwd = target;
        session.variables.insert("OLDPWD".to_string(), old);
        session
            .variables
            .insert("PWD".to_string(), session.cwd_string());
        ExecutionResult::ok(String::new())
    }
}

fn resolve(cwd: &std::path::Path, p: &str) -> PathBuf {
    let candidate = PathBuf::from(p);
    if candidate.is_absolute() {
        candidate
    } else {
        cwd.join(candidate)
    }
}

pub struct PwdCommand;

#[async_trait]
impl Builtin for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }

    async fn execute(&self, _args: &[String], session: &mut Session) -> ExecutionResult {
        ExecutionResult::ok(format!("{}\n", session.cwd_string()))
    }
}

pub struct HomeCommand;

#[async_trait]
impl Builtin for HomeCommand {
    fn name(&self) -> &'static str {
        "home"
    }

    async fn execute(&self, _args: &[String], session: &mut Session) -> ExecutionResult {
        session.cwd = session.home.clone();
        session
            .variables
            .insert("PWD".to_string(), session.cwd_string());
        ExecutionResult::ok(format!("{}\n", session.cwd_string()))
    }
}

pub struct ClearCommand;

#[async_trait]
impl Builtin for ClearCommand {
    fn name(&self) -> &'static str {
        "clear"
    }

    async fn execute(&self, _args: &[String], _session: &mut Session) -> ExecutionResult {
        ExecutionResult::ok("\u{1b}[2J\u{1b}[H")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;

    #[tokio::test]
    async fn cd_no_args_goes_home() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(SessionOptions {
            cwd: Some(dir.path().to_path_buf()),
            home: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        session.cwd = sub;
        let result = CdCommand.execute(&[], &mut session).await;
        assert!(result.is_success());
        assert_eq!(session.cwd, dir.path());
    }

    #[tokio::test]
    async fn cd_dash_goes_to_oldpwd() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let mut session = Session::new(SessionOptions {
            cwd: Some(dir.path().to_path_buf()),
            home: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        CdCommand
            .execute(&[sub.display().to_string()], &mut session)
            .await;
        CdCommand
            .execute(&["-".to_string()], &mut session)
            .await;
        assert_eq!(session.cwd, dir.path());
    }

    #[tokio::test]
    async fn cd_nonexistent_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(SessionOptions {
            cwd: Some(dir.path().to_path_buf()),
            home: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        let result = CdCommand
            .execute(&["nope".to_string()], &mut session)
            .await;
        assert_eq!(result.exit_code, 1);
    }
}
