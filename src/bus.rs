//! Streaming message bus consumed by a TUI front-end, a test harness, or a
//! log collector. The chain evaluator and job supervisor are producers; the
//! `Dispatcher` is a plain sink capability so no consumer framework leaks in
//! here (per the design notes' "avoid coupling to any UI framework").

use std::sync::Arc;

/// One event in the per-command message sequence: exactly one `Started`,
/// zero or more `Stdout`/`Stderr`, exactly one `Exited`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Started {
        cmd: String,
        pid: Option<u32>,
        err: Option<String>,
    },
    Stdout {
        line: String,
    },
    Stderr {
        line: String,
    },
    Exited {
        code: i32,
        err: Option<String>,
    },
}

/// A caller-supplied sink for streaming messages. Must be safe to invoke
/// concurrently (job supervisors and the foreground executor may both hold
/// a clone).
pub type Dispatcher = Arc<dyn Fn(Message) + Send + Sync>;

/// Emit a message if a dispatcher is set; a no-op otherwise.
pub fn emit(dispatcher: &Option<Dispatcher>, message: Message) {
    if let Some(d) = dispatcher {
        d(message);
    }
}
