use clap::Parser;
use lucien_shell::{ExecutorMode, SecurityMode, SessionOptions, Shell};
use std::io::{BufRead, Write};

#[derive(Parser)]
#[command(name = "lucien")]
#[command(about = "An interactive command-shell execution engine")]
#[command(version)]
struct Cli {
    /// Execute a single command chain and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Working directory for the session
    #[arg(long = "cwd")]
    cwd: Option<String>,

    /// Reject non-whitelisted commands per the strict security policy
    #[arg(long = "strict")]
    strict: bool,

    /// How external commands are run: delegate to the host shell, or
    /// resolve and spawn directly via PATH
    #[arg(long = "executor", value_parser = ["shell", "internal"], default_value = "shell")]
    executor: String,

    /// Output the final result as JSON (stdout, stderr, exitCode)
    #[arg(long = "json")]
    json: bool,

    /// A file of command chains, one per line
    #[arg()]
    script_file: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let options = SessionOptions {
        cwd: cli.cwd.clone().map(std::path::PathBuf::from),
        home: None,
        security_mode: Some(if cli.strict {
            SecurityMode::Strict
        } else {
            SecurityMode::Permissive
        }),
        executor_mode: Some(if cli.executor == "internal" {
            ExecutorMode::Internal
        } else {
            ExecutorMode::Shell
        }),
    };
    let mut shell = Shell::new(options);

    let exit_code = if let Some(line) = cli.command {
        run_lines(&mut shell, std::iter::once(line), cli.json).await
    } else if let Some(path) = &cli.script_file {
        match std::fs::read_to_string(path) {
            Ok(content) => run_lines(&mut shell, content.lines().map(str::to_string), cli.json).await,
            Err(e) => {
                eprintln!("lucien: cannot read {path}: {e}");
                1
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            run_repl(&mut shell).await
        } else {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf).unwrap_or_default();
            run_lines(&mut shell, buf.lines().map(str::to_string), cli.json).await
        }
    };

    shell.shutdown().await;
    std::process::exit(exit_code);
}

/// Run every line through the shell, print according to `json`, and return
/// the last executed line's exit code.
async fn run_lines(
    shell: &mut lucien_shell::Shell,
    lines: impl Iterator<Item = String>,
    json: bool,
) -> i32 {
    let mut exit_code = 0;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let result = shell.execute_line(&line).await;
        exit_code = result.exit_code;
        print_result(&result, json);
        if shell.session.exit_requested.is_some() {
            break;
        }
    }
    exit_code
}

async fn run_repl(shell: &mut lucien_shell::Shell) -> i32 {
    let stdin = std::io::stdin();
    let mut exit_code = 0;
    loop {
        print!("lucien> ");
        if std::io::stdout().flush().is_err() {
            break;
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        let result = shell.execute_line(line).await;
        exit_code = result.exit_code;
        print_result(&result, false);
        if shell.session.exit_requested.is_some() {
            break;
        }
    }
    exit_code
}

fn print_result(result: &lucien_shell::ExecutionResult, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "stdout": result.output,
                "stderr": result.error,
                "exitCode": result.exit_code,
            })
        );
    } else {
        if !result.output.is_empty() {
            print!("{}", result.output);
        }
        if !result.error.is_empty() {
            eprint!("{}", result.error);
        }
    }
}
