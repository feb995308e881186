//! Process-lifetime session state (§3): cwd, variables, aliases, history,
//! jobs, security/executor mode, and the message-bus dispatcher.

use crate::bus::Dispatcher;
use crate::history::HistoryStore;
use crate::jobs::JobRegistry;
use crate::security::SecurityMode;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorMode {
    Shell,
    Internal,
}

/// Construction-time options, split from per-call configuration so a long-
/// lived session can be built once and reused across many command chains.
#[derive(Default)]
pub struct SessionOptions {
    pub cwd: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub security_mode: Option<SecurityMode>,
    pub executor_mode: Option<ExecutorMode>,
}

pub struct Session {
    pub cwd: PathBuf,
    pub home: PathBuf,
    pub variables: HashMap<String, String>,
    pub aliases: HashMap<String, String>,
    pub history: HistoryStore,
    pub jobs: JobRegistry,
    pub security_mode: SecurityMode,
    pub executor_mode: ExecutorMode,
    pub dispatcher: Option<Dispatcher>,
    /// Set by the `exit` built-in; a front end (REPL, batch runner) polls
    /// this after every line to know when to stop driving the session.
    pub exit_requested: Option<i32>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let home = options
            .home
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("/"));
        let cwd = options
            .cwd
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| home.clone());

        let mut variables = HashMap::new();
        for (k, v) in std::env::vars() {
            variables.insert(k, v);
        }
        variables.insert("PWD".to_string(), cwd.display().to_string());

        Self {
            history: HistoryStore::new(&home),
            cwd,
            home,
            variables,
            aliases: HashMap::new(),
            jobs: JobRegistry::new(),
            security_mode: options.security_mode.unwrap_or(SecurityMode::Permissive),
            executor_mode: options.executor_mode.unwrap_or(ExecutorMode::Shell),
            dispatcher: None,
            exit_requested: None,
        }
    }

    pub fn set_dispatcher(&mut self, dispatcher: Dispatcher) {
        self.dispatcher = Some(dispatcher);
    }

    pub fn cwd_string(&self) -> String {
        self.cwd.display().to_string()
    }

    /// Environment the external executor passes to a child: session
    /// variables exported as KEY=VALUE, with `PATH` always inherited at
    /// minimum so external commands resolve (see DESIGN.md, Open Question
    /// resolution #2).
    pub fn export_environment(&self) -> HashMap<String, String> {
        let mut env = self.variables.clone();
        env.entry("PATH".to_string())
            .or_insert_with(|| std::env::var("PATH").unwrap_or_default());
        env.insert("PWD".to_string(), self.cwd_string());
        env
    }

    /// Flush history and signal every running job on teardown (§3 lifecycle).
    pub async fn shutdown(&self) {
        self.jobs.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_pwd_from_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(SessionOptions {
            cwd: Some(dir.path().to_path_buf()),
            home: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        assert_eq!(
            session.variables.get("PWD"),
            Some(&dir.path().display().to_string())
        );
    }

    #[test]
    fn export_environment_always_has_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(SessionOptions {
            cwd: Some(dir.path().to_path_buf()),
            home: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        session.variables.remove("PATH");
        let env = session.export_environment();
        assert!(env.contains_key("PATH"));
    }
}
