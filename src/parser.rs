//! Ties the two lexer passes together into a `CommandChain` and performs
//! (non-recursive) alias expansion.

use crate::errors::ParseError;
use crate::lexer::{split_chain, tokenize_command};
use crate::types::{Command, CommandChain, OperatorType};
use std::collections::HashMap;

/// Parse a raw input line (already expansion-passed) into a `CommandChain`.
///
/// Whitespace-only input yields an empty chain (§4.1). `aliases` maps alias
/// name to expansion text; expansion is one-level only — the alias text is
/// re-tokenized but never itself re-expanded.
pub fn parse_chain(
    input: &str,
    aliases: &HashMap<String, String>,
) -> Result<CommandChain, ParseError> {
    if input.trim().is_empty() {
        return Ok(CommandChain::default());
    }

    let (segments, mut operators, trailing_background) = split_chain(input)?;
    let mut commands = Vec::with_capacity(segments.len());
    for segment in &segments {
        let mut cmd = tokenize_command(segment)?;
        expand_alias(&mut cmd, aliases);
        commands.push(cmd);
    }

    if trailing_background {
        operators.push(OperatorType::Background);
        // A trailing `&` backgrounds the chain's final command; model it as
        // a connector to a synthetic empty continuation the evaluator
        // recognizes and skips (see evaluator::execute_chain).
        commands.push(Command::new("", Vec::new()));
    }

    Ok(CommandChain {
        commands,
        operators,
    })
}

/// Expand `cmd.name` once if it names an alias. The alias's own text is
/// tokenized fresh (pass 2 applied to the alias text) but never checked
/// against the alias table again, so an alias can never recurse into
/// itself even if its expansion happens to repeat the same name.
fn expand_alias(cmd: &mut Command, aliases: &HashMap<String, String>) {
    let Some(alias_text) = aliases.get(&cmd.name) else {
        return;
    };
    let Ok(expanded) = tokenize_command(alias_text) else {
        return;
    };

    let mut new_args = expanded.args;
    new_args.extend(std::mem::take(&mut cmd.args));
    cmd.name = expanded.name;
    cmd.args = new_args;
    for (k, v) in expanded.redirects {
        cmd.redirects.entry(k).or_insert(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_chain() {
        let chain = parse_chain("   ", &HashMap::new()).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn alias_expansion_prepends_tokens() {
        let mut aliases = HashMap::new();
        aliases.insert("ll".to_string(), "ls -la".to_string());
        let chain = parse_chain("ll /tmp", &aliases).unwrap();
        assert_eq!(chain.commands[0].name, "ls");
        assert_eq!(chain.commands[0].args, vec!["-la", "/tmp"]);
    }

    #[test]
    fn alias_is_not_recursively_expanded() {
        let mut aliases = HashMap::new();
        aliases.insert("ls".to_string(), "ls --color".to_string());
        let chain = parse_chain("ls", &aliases).unwrap();
        assert_eq!(chain.commands[0].name, "ls");
        assert_eq!(chain.commands[0].args, vec!["--color"]);
    }

    #[test]
    fn quoted_operators_yield_single_command() {
        let chain = parse_chain("echo \"operators && inside quotes\"", &HashMap::new()).unwrap();
        assert_eq!(chain.commands.len(), 1);
    }
}
