//! Core data model: `Command`, `CommandChain`, `Job`, `ExecutionResult` (§3).

use std::collections::HashMap;
use std::time::Duration;

/// One parsed invocation within a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    /// Operator symbol (">", ">>", "<") to filename.
    pub redirects: HashMap<String, String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
            redirects: HashMap::new(),
        }
    }

    /// Reassembled text, used by the security guard and job bookkeeping.
    pub fn joined(&self) -> String {
        if self.args.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.args.join(" "))
        }
    }
}

/// Connector between consecutive commands in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorType {
    Pipe,
    And,
    Or,
    Sequence,
    Background,
}

impl OperatorType {
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorType::Pipe => "|",
            OperatorType::And => "&&",
            OperatorType::Or => "||",
            OperatorType::Sequence => ";",
            OperatorType::Background => "&",
        }
    }
}

/// An ordered list of commands with `len(commands) - 1` connecting operators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandChain {
    pub commands: Vec<Command>,
    pub operators: Vec<OperatorType>,
}

impl CommandChain {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// State of a tracked background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Completed,
    Failed,
    Killed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Killed
        )
    }
}

/// A tracked background process.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    pub command: String,
    pub args: Vec<String>,
    pub pid: Option<u32>,
    pub state: JobState,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub exit_code: Option<i32>,
    pub working_dir: String,
    pub environment: HashMap<String, String>,
}

/// The result of dispatching any command or chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub output: String,
    pub error: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: String::new(),
            exit_code: 0,
            duration: Duration::ZERO,
        }
    }

    pub fn failure(error: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: String::new(),
            error: error.into(),
            exit_code,
            duration: Duration::ZERO,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Aggregate a chain's results per §4.4: concatenated stdout/stderr (each
/// command's output already carries its own trailing newline), summed
/// duration, exit code of the last *executed* command.
pub fn aggregate(results: &[ExecutionResult]) -> ExecutionResult {
    let mut output_parts = Vec::new();
    let mut error_parts = Vec::new();
    let mut duration = Duration::ZERO;
    let mut exit_code = 0;

    for r in results {
        if !r.output.is_empty() {
            output_parts.push(r.output.clone());
        }
        if !r.error.is_empty() {
            error_parts.push(r.error.clone());
        }
        duration += r.duration;
        exit_code = r.exit_code;
    }

    ExecutionResult {
        output: output_parts.concat(),
        error: error_parts.concat(),
        exit_code,
        duration,
    }
}
