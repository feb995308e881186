//! File-operation built-ins: `ls`, `mkdir`, `rm`, `cp`, `mv`, `cat`, `touch`,
//! `grep`, `sort`, `wc`, `head`, `tail`, `find` (§4.6).
//!
//! These run against the real filesystem (unlike the in-memory sandboxed
//! filesystem a bash interpreter would use), rooted at `session.cwd` for
//! relative paths.

use super::{usage_error, Builtin};
use crate::session::Session;
use crate::types::ExecutionResult;
use async_trait::async_trait;
use regex_lite::Regex;
use std::fs;
use std::path::{Path, PathBuf};

fn resolve(session: &Session, raw: &str) -> PathBuf {
    let p = Path::new(raw);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        session.cwd.join(p)
    }
}

pub struct LsCommand;

#[async_trait]
impl Builtin for LsCommand {
    fn name(&self) -> &'static str {
        "ls"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let mut show_all = false;
        let mut long = false;
        let mut targets = Vec::new();
        for a in args {
            match a.as_str() {
                "-a" => show_all = true,
                "-l" => long = true,
                "-la" | "-al" => {
                    show_all = true;
                    long = true;
                }
                other => targets.push(other.to_string()),
            }
        }
        let dir = if targets.is_empty() {
            session.cwd.clone()
        } else {
            resolve(session, &targets[0])
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => return usage_error("ls", format!("{}: {e}", dir.display())),
        };

        let mut names: Vec<String> = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !show_all && name.starts_with('.') {
                continue;
            }
            if long {
                let meta = entry.metadata().ok();
                let kind = meta.as_ref().map(|m| if m.is_dir() { "d" } else { "-" }).unwrap_or("?");
                let size = meta.map(|m| m.len()).unwrap_or(0);
                names.push(format!("{kind} {size:>10} {name}"));
            } else {
                names.push(name);
            }
        }
        names.sort();
        ExecutionResult::ok(format!("{}\n", names.join("\n")))
    }
}

pub struct MkdirCommand;

#[async_trait]
impl Builtin for MkdirCommand {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let parents = args.iter().any(|a| a == "-p");
        let targets: Vec<&String> = args.iter().filter(|a| a.as_str() != "-p").collect();
        if targets.is_empty() {
            return usage_error("mkdir", "usage: mkdir [-p] DIR...");
        }
        for raw in targets {
            let path = resolve(session, raw);
            let result = if parents {
                fs::create_dir_all(&path)
            } else {
                fs::create_dir(&path)
            };
            if let Err(e) = result {
                return usage_error("mkdir", format!("{}: {e}", path.display()));
            }
        }
        ExecutionResult::ok(String::new())
    }
}

pub struct RmCommand;

#[async_trait]
impl Builtin for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let recursive = args.iter().any(|a| a == "-r" || a == "-rf" || a == "-fr");
        let force = args.iter().any(|a| a == "-f" || a == "-rf" || a == "-fr");
        let targets: Vec<&String> = args
            .iter()
            .filter(|a| !a.starts_with('-'))
            .collect();
        if targets.is_empty() {
            return usage_error("rm", "usage: rm [-r] [-f] PATH...");
        }
        for raw in targets {
            let path = resolve(session, raw);
            let result = if path.is_dir() {
                if recursive {
                    fs::remove_dir_all(&path)
                } else {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "is a directory (use -r)",
                    ))
                }
            } else {
                fs::remove_file(&path)
            };
            if let Err(e) = result {
                if force {
                    continue;
                }
                return usage_error("rm", format!("{}: {e}", path.display()));
            }
        }
        ExecutionResult::ok(String::new())
    }
}

pub struct CpCommand;

#[async_trait]
impl Builtin for CpCommand {
    fn name(&self) -> &'static str {
        "cp"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.len() != 2 {
            return usage_error("cp", "usage: cp SRC DST (single-file only)");
        }
        let src = resolve(session, &args[0]);
        let dst = resolve(session, &args[1]);
        if src.is_dir() {
            return usage_error("cp", format!("{}: directory copy is not supported", src.display()));
        }
        if let Err(e) = fs::copy(&src, &dst) {
            return usage_error("cp", format!("{}: {e}", src.display()));
        }
        ExecutionResult::ok(String::new())
    }
}

pub struct MvCommand;

#[async_trait]
impl Builtin for MvCommand {
    fn name(&self) -> &'static str {
        "mv"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.len() != 2 {
            return usage_error("mv", "usage: mv SRC DST");
        }
        let src = resolve(session, &args[0]);
        let dst = resolve(session, &args[1]);
        if let Err(e) = fs::rename(&src, &dst) {
            return usage_error("mv", format!("{}: {e}", src.display()));
        }
        ExecutionResult::ok(String::new())
    }
}

pub struct CatCommand;

#[async_trait]
impl Builtin for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            return usage_error("cat", "usage: cat FILE...");
        }
        let mut output = String::new();
        for raw in args {
            let path = resolve(session, raw);
            match fs::read_to_string(&path) {
                Ok(content) => output.push_str(&content),
                Err(e) => return usage_error("cat", format!("{}: {e}", path.display())),
            }
        }
        ExecutionResult::ok(output)
    }
}

pub struct TouchCommand;

#[async_trait]
impl Builtin for TouchCommand {
    fn name(&self) -> &'static str {
        "touch"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            return usage_error("touch", "usage: touch FILE...");
        }
        for raw in args {
            let path = resolve(session, raw);
            if path.exists() {
                let now = std::time::SystemTime::now();
                if let Err(e) = fs::File::open(&path).and_then(|f| f.set_modified(now)) {
                    return usage_error("touch", format!("{}: {e}", path.display()));
                }
            } else if let Err(e) = fs::File::create(&path) {
                return usage_error("touch", format!("{}: {e}", path.display()));
            }
        }
        ExecutionResult::ok(String::new())
    }
}

pub struct GrepCommand;

#[async_trait]
impl Builtin for GrepCommand {
    fn name(&self) -> &'static str {
        "grep"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.len() < 2 {
            return usage_error("grep", "usage: grep PATTERN FILE...");
        }
        let pattern = match Regex::new(&args[0]) {
            Ok(re) => re,
            Err(e) => return usage_error("grep", format!("invalid pattern: {e}")),
        };
        let files = &args[1..];
        let multi = files.len() > 1;

        let mut matches = Vec::new();
        for raw in files {
            let path = resolve(session, raw);
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => return usage_error("grep", format!("{}: {e}", path.display())),
            };
            for line in content.lines() {
                if pattern.is_match(line) {
                    if multi {
                        matches.push(format!("{raw}:{line}"));
                    } else {
                        matches.push(line.to_string());
                    }
                }
            }
        }

        if matches.is_empty() {
            ExecutionResult::failure(String::new(), 1)
        } else {
            ExecutionResult::ok(format!("{}\n", matches.join("\n")))
        }
    }
}

pub struct SortCommand;

#[async_trait]
impl Builtin for SortCommand {
    fn name(&self) -> &'static str {
        "sort"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            return usage_error("sort", "usage: sort FILE...");
        }
        let mut lines = Vec::new();
        for raw in args {
            let path = resolve(session, raw);
            match fs::read_to_string(&path) {
                Ok(content) => lines.extend(content.lines().map(str::to_string)),
                Err(e) => return usage_error("sort", format!("{}: {e}", path.display())),
            }
        }
        lines.sort();
        ExecutionResult::ok(format!("{}\n", lines.join("\n")))
    }
}

pub struct WcCommand;

#[async_trait]
impl Builtin for WcCommand {
    fn name(&self) -> &'static str {
        "wc"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        let mut lines_flag = args.iter().any(|a| a == "-l");
        let words_flag = args.iter().any(|a| a == "-w");
        let chars_flag = args.iter().any(|a| a == "-c");
        if !lines_flag && !words_flag && !chars_flag {
            lines_flag = true;
        }
        let targets: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
        if targets.is_empty() {
            return usage_error("wc", "usage: wc [-l] [-w] [-c] FILE...");
        }

        let mut out = Vec::new();
        for raw in targets {
            let path = resolve(session, raw);
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => return usage_error("wc", format!("{}: {e}", path.display())),
            };
            let mut fields = Vec::new();
            if lines_flag {
                fields.push(content.lines().count().to_string());
            }
            if words_flag {
                fields.push(content.split_whitespace().count().to_string());
            }
            if chars_flag {
                fields.push(content.chars().count().to_string());
            }
            out.push(format!("{} {raw}", fields.join(" ")));
        }
        ExecutionResult::ok(format!("{}\n", out.join("\n")))
    }
}

pub struct HeadCommand;

#[async_trait]
impl Builtin for HeadCommand {
    fn name(&self) -> &'static str {
        "head"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        run_head_or_tail(args, session, true).await
    }
}

pub struct TailCommand;

#[async_trait]
impl Builtin for TailCommand {
    fn name(&self) -> &'static str {
        "tail"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        run_head_or_tail(args, session, false).await
    }
}

async fn run_head_or_tail(args: &[String], session: &Session, head: bool) -> ExecutionResult {
    let cmd_name = if head { "head" } else { "tail" };
    let mut count = 10usize;
    let mut targets = Vec::new();
    let mut iter = args.iter().peekable();
    while let Some(a) = iter.next() {
        if a == "-n" {
            match iter.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) => count = n,
                None => return usage_error(cmd_name, "-n requires a number"),
            }
        } else if let Some(rest) = a.strip_prefix('-') {
            if let Ok(n) = rest.parse::<usize>() {
                count = n;
            } else {
                targets.push(a.clone());
            }
        } else {
            targets.push(a.clone());
        }
    }
    if targets.is_empty() {
        return usage_error(cmd_name, format!("usage: {cmd_name} [-n N] FILE"));
    }
    let path = resolve(session, &targets[0]);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => return usage_error(cmd_name, format!("{}: {e}", path.display())),
    };
    let lines: Vec<&str> = content.lines().collect();
    let selected = if head {
        lines.iter().take(count).copied().collect::<Vec<_>>()
    } else {
        let start = lines.len().saturating_sub(count);
        lines[start..].to_vec()
    };
    ExecutionResult::ok(format!("{}\n", selected.join("\n")))
}

pub struct FindCommand;

#[async_trait]
impl Builtin for FindCommand {
    fn name(&self) -> &'static str {
        "find"
    }

    async fn execute(&self, args: &[String], session: &mut Session) -> ExecutionResult {
        if args.is_empty() {
            return usage_error("find", "usage: find PATH [-name GLOB]");
        }
        let root = resolve(session, &args[0]);
        let mut name_glob: Option<String> = None;
        let mut iter = args[1..].iter();
        while let Some(a) = iter.next() {
            if a == "-name" {
                name_glob = iter.next().cloned();
            }
        }

        let mut matches = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(e) => e,
                Err(e) => return usage_error("find", format!("{}: {e}", dir.display())),
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                let matches_glob = name_glob
                    .as_ref()
                    .map(|g| glob_pattern(g).matches(&name))
                    .unwrap_or(true);
                if matches_glob {
                    matches.push(path.display().to_string());
                }
                if path.is_dir() {
                    stack.push(path);
                }
            }
        }
        matches.sort();
        ExecutionResult::ok(format!("{}\n", matches.join("\n")))
    }
}

/// Compile a `-name` filter into a `glob::Pattern`, falling back to a
/// pattern that only matches itself literally if the filter isn't valid
/// glob syntax (e.g. contains an unmatched `[`).
fn glob_pattern(raw: &str) -> glob::Pattern {
    glob::Pattern::new(raw).unwrap_or_else(|_| {
        glob::Pattern::new(&glob::Pattern::escape(raw)).expect("escaped literal always compiles")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;

    fn session_in(dir: &Path) -> Session {
        Session::new(SessionOptions {
            cwd: Some(dir.to_path_buf()),
            home: Some(dir.to_path_buf()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn mkdir_and_ls() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session_in(dir.path());
        MkdirCommand
            .execute(&["sub".to_string()], &mut s)
            .await;
        let result = LsCommand.execute(&[], &mut s).await;
        assert!(result.output.contains("sub"));
    }

    #[tokio::test]
    async fn cat_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
        let mut s = session_in(dir.path());
        let result = CatCommand
            .execute(&["a.txt".to_string()], &mut s)
            .await;
        assert_eq!(result.output, "hello\n");
    }

    #[tokio::test]
    async fn cp_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();
        let mut s = session_in(dir.path());
        let result = CpCommand
            .execute(&["d".to_string(), "d2".to_string()], &mut s)
            .await;
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn grep_prefixes_filename_for_multiple_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "match\nno\n").unwrap();
        fs::write(dir.path().join("b.txt"), "match\n").unwrap();
        let mut s = session_in(dir.path());
        let result = GrepCommand
            .execute(
                &["match".to_string(), "a.txt".to_string(), "b.txt".to_string()],
                &mut s,
            )
            .await;
        assert!(result.output.contains("a.txt:match"));
        assert!(result.output.contains("b.txt:match"));
    }

    #[tokio::test]
    async fn wc_default_is_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
        let mut s = session_in(dir.path());
        let result = WcCommand
            .execute(&["a.txt".to_string()], &mut s)
            .await;
        assert!(result.output.starts_with("3 "));
    }

    #[tokio::test]
    async fn head_default_limits_to_ten() {
        let dir = tempfile::tempdir().unwrap();
        let content = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        fs::write(dir.path().join("a.txt"), content).unwrap();
        let mut s = session_in(dir.path());
        let result = HeadCommand
            .execute(&["a.txt".to_string()], &mut s)
            .await;
        assert_eq!(result.output.lines().count(), 10);
    }

    #[tokio::test]
    async fn find_name_glob() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        let mut s = session_in(dir.path());
        let result = FindCommand
            .execute(&[".".to_string(), "-name".to_string(), "*.rs".to_string()], &mut s)
            .await;
        assert!(result.output.contains("a.rs"));
        assert!(!result.output.contains("a.txt"));
    }
}
