//! Security guard: cheap, deterministic gating of a chain before dispatch.
//!
//! The guard is a pure function of `(chain, mode)`. The dangerous-pattern
//! table is data, not code (precompiled once at `Guard::new`), so it can be
//! audited and tested independently of the matching logic (§9 design note).

use crate::errors::PolicyViolation;
use crate::types::{CommandChain, OperatorType};
use regex_lite::Regex;

lazy_static::lazy_static! {
    /// Compiled once for the process rather than recompiled per `Guard`.
    static ref PATTERNS: Vec<DangerousPattern> = {
        let specs: &[(&str, &str)] = &[
            (r"\$\(.*\)", "command substitution $(...)"),
            (r"`[^`]*`", "command substitution (backticks)"),
            (r"\|\s*\S+\s*>", "pipe to file redirection chain"),
            (r">\s*/dev/", "write to a device file"),
            (r">&\d", "file-descriptor manipulation"),
            (r"\|\s*(sh|bash|powershell)\s*$", "pipe to another shell"),
            (r";\s*rm\s+-rf", "chained destructive operation (rm -rf)"),
            (r";\s*del\s+/[sqf]", "chained destructive operation (del)"),
        ];
        specs
            .iter()
            .map(|(pattern, description)| DangerousPattern {
                regex: Regex::new(pattern).expect("static security pattern must compile"),
                description,
            })
            .collect()
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    Permissive,
    Strict,
}

impl SecurityMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Some(SecurityMode::Strict),
            "permissive" => Some(SecurityMode::Permissive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SecurityMode::Strict => "strict",
            SecurityMode::Permissive => "permissive",
        }
    }
}

/// Built-ins considered safe in strict mode regardless of their arguments.
pub const WHITELIST: &[&str] = &[
    "echo", "pwd", "cd", "ls", "dir", "cat", "type", "help", "history", "alias", "unalias",
    "set", "unset", "export", "clear", "exit", "jobs", "fg", "bg", "kill",
];

struct DangerousPattern {
    regex: Regex,
    description: &'static str,
}

pub struct Guard;

impl Guard {
    pub fn new() -> Self {
        Self
    }

    fn is_whitelisted(name: &str) -> bool {
        WHITELIST.iter().any(|w| w.eq_ignore_ascii_case(name))
    }

    fn dangerous_pattern(&self, text: &str) -> Option<&'static str> {
        PATTERNS
            .iter()
            .find(|p| p.regex.is_match(text))
            .map(|p| p.description)
    }

    /// Check a chain against the current mode. `permissive` admits
    /// everything; `strict` applies the three rules from §4.3.
    pub fn check(&self, chain: &CommandChain, mode: SecurityMode) -> Result<(), PolicyViolation> {
        if mode == SecurityMode::Permissive {
            return Ok(());
        }

        for cmd in &chain.commands {
            if cmd.name.is_empty() {
                continue;
            }
            if Self::is_whitelisted(&cmd.name) {
                continue;
            }
            let text = format!("{} {}", cmd.name, cmd.args.join(" "));
            if let Some(pattern) = self.dangerous_pattern(&text) {
                return Err(PolicyViolation(format!(
                    "strict mode: `{}` matches a dangerous pattern ({})",
                    cmd.joined(),
                    pattern
                )));
            }
        }

        for (i, op) in chain.operators.iter().enumerate() {
            if matches!(
                op,
                OperatorType::And | OperatorType::Or | OperatorType::Pipe
            ) {
                let preceding = &chain.commands[i];
                let following = chain.commands.get(i + 1);
                if !preceding.name.is_empty() && !Self::is_whitelisted(&preceding.name) {
                    return Err(PolicyViolation(format!(
                        "strict mode: operator `{}` after non-whitelisted command `{}`",
                        op.symbol(),
                        preceding.name
                    )));
                }
                if let Some(following) = following {
                    if !following.name.is_empty() && !Self::is_whitelisted(&following.name) {
                        return Err(PolicyViolation(format!(
                            "strict mode: operator `{}` before non-whitelisted command `{}`",
                            op.symbol(),
                            following.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new()
    }
}
