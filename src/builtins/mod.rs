//! Built-in command registry and the `Builtin` trait each built-in
//! implements. Built-ins run against the real filesystem/process table and
//! take `&mut Session` for cwd/variable/job state (§4.6).

pub mod alias_cmd;
pub mod echo_cmd;
pub mod fileops;
pub mod history_cmd;
pub mod jobs_cmd;
pub mod nav;
pub mod secure_cmd;
pub mod system;
pub mod vars;

use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;

#[async_trait]
pub trait Builtin: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult;
}

/// Run a builtin and stamp `duration` from a local start timestamp, matching
/// "all built-ins set `duration` from a local start timestamp" (§4.6).
pub async fn dispatch(
    builtin: &dyn Builtin,
    args: &[String],
    session: &mut Session,
) -> ExecutionResult {
    let start = Instant::now();
    let mut result = builtin.execute(args, session).await;
    result.duration = start.elapsed();
    result
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn Builtin>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };
        registry.register(Box::new(echo_cmd::EchoCommand));
        registry.register(Box::new(nav::CdCommand));
        registry.register(Box::new(nav::PwdCommand));
        registry.register(Box::new(nav::HomeCommand));
        registry.register(Box::new(nav::ClearCommand));
        registry.register(Box::new(vars::SetCommand));
        registry.register(Box::new(vars::UnsetCommand));
        registry.register(Box::new(vars::ExportCommand));
        registry.register(Box::new(vars::EnvCommand));
        registry.register(Box::new(alias_cmd::AliasCommand));
        registry.register(Box::new(alias_cmd::UnaliasCommand));
        registry.register(Box::new(history_cmd::HistoryCommand));
        registry.register(Box::new(jobs_cmd::JobsCommand));
        registry.register(Box::new(jobs_cmd::FgCommand));
        registry.register(Box::new(jobs_cmd::BgCommand));
        registry.register(Box::new(jobs_cmd::DisownCommand));
        registry.register(Box::new(jobs_cmd::SuspendCommand));
        registry.register(Box::new(jobs_cmd::KillCommand));
        registry.register(Box::new(secure_cmd::SecureCommand));
        registry.register(Box::new(secure_cmd::HelpCommand));
        registry.register(Box::new(secure_cmd::ExitCommand));
        registry.register(Box::new(fileops::LsCommand));
        registry.register(Box::new(fileops::MkdirCommand));
        registry.register(Box::new(fileops::RmCommand));
        registry.register(Box::new(fileops::CpCommand));
        registry.register(Box::new(fileops::MvCommand));
        registry.register(Box::new(fileops::CatCommand));
        registry.register(Box::new(fileops::TouchCommand));
        registry.register(Box::new(fileops::GrepCommand));
        registry.register(Box::new(fileops::SortCommand));
        registry.register(Box::new(fileops::WcCommand));
        registry.register(Box::new(fileops::HeadCommand));
        registry.register(Box::new(fileops::TailCommand));
        registry.register(Box::new(fileops::FindCommand));
        registry.register(Box::new(system::PsCommand));
        registry.register(Box::new(system::KillProcCommand));
        registry.register(Box::new(system::DfCommand));
        registry.register(Box::new(system::UptimeCommand));
        registry.register(Box::new(system::WhoamiCommand));
        registry.register(Box::new(system::SysteminfoCommand));
        registry.register(Box::new(system::PingCommand));
        registry
    }

    fn register(&mut self, cmd: Box<dyn Builtin>) {
        self.commands.insert(cmd.name(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Builtin> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `cmd: error message` usage-error helper shared by every built-in
/// (§4.6 Error surface: "descriptive error on usage errors").
pub fn usage_error(cmd: &str, message: impl std::fmt::Display) -> ExecutionResult {
    ExecutionResult::failure(format!("{cmd}: {message}\n"), 1)
}
