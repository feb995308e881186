//! `echo` built-in (§4.6): join args with single spaces, always emit a
//! trailing newline.

use super::Builtin;
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;

pub struct EchoCommand;

#[async_trait]
impl Builtin for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn execute(&self, args: &[String], _session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            ExecutionResult::ok("\n")
        } else {
            ExecutionResult::ok(format!("{}\n", args.join(" ")))
        }
    }
}
