//! Shell-style command surface.
//!
//! `exec` parses a fixed command grammar into the same direct methods the
//! host could call itself, and renders results the way a terminal expects:
//! diagnostics as `SEVERITY: file:line:col: message`, bundle errors with the
//! offending line and a caret. Exit codes: 0 success, 1 caller error, 2
//! pipeline failure.

use clap::{Parser, Subcommand};

use sandlot_common::diagnostics::{BundleError, CheckOutcome, Diagnostic};

use crate::build::{BuildFailure, BuildOptions};
use crate::sandbox::Sandbox;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    fn ok(stdout: String) -> Self {
        Self {
            exit_code: 0,
            stdout,
            stderr: String::new(),
        }
    }

    fn caller_error(stderr: String) -> Self {
        Self {
            exit_code: 1,
            stdout: String::new(),
            stderr,
        }
    }

    fn pipeline_failure(stderr: String) -> Self {
        Self {
            exit_code: 2,
            stdout: String::new(),
            stderr,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sandlot", disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pin a package and fetch its type definitions.
    Install { spec: String },
    /// Remove a dependency and its installed types.
    Uninstall { name: String },
    /// Typecheck, bundle and load the project.
    Build {
        #[arg(long)]
        skip_typecheck: bool,
        #[arg(long)]
        minify: bool,
        #[arg(long)]
        tailwind: bool,
        entry: Option<String>,
    },
    /// Typecheck only.
    Typecheck { entry: Option<String> },
}

impl Sandbox {
    /// Execute one command string. Unknown commands and bad arguments are
    /// caller errors (`exit_code: 1`), never panics.
    pub async fn exec(&self, command: &str) -> ExecResult {
        let tokens = split_command(command);
        if tokens.is_empty() {
            return ExecResult::caller_error("empty command\n".to_string());
        }

        let cli = match Cli::try_parse_from(std::iter::once("sandlot".to_string()).chain(tokens)) {
            Ok(cli) => cli,
            Err(error) => return ExecResult::caller_error(error.to_string()),
        };

        match cli.command {
            Command::Install { spec } => match self.install(&spec).await {
                Ok(report) => {
                    let mut line = format!("Installed {}@{}", report.name, report.version);
                    if report.types_installed {
                        let cached = if report.from_cache { ", cached" } else { "" };
                        line.push_str(&format!(
                            " ({} type file{}{cached})",
                            report.type_files_count,
                            if report.type_files_count == 1 { "" } else { "s" },
                        ));
                    }
                    line.push('\n');
                    let mut result = ExecResult::ok(line);
                    if let Some(error) = report.types_error {
                        result.stderr = format!("warning: {error}\n");
                    }
                    result
                }
                Err(error) => ExecResult::caller_error(format!("{error}\n")),
            },
            Command::Uninstall { name } => match self.uninstall(&name).await {
                Ok(report) if report.removed => {
                    ExecResult::ok(format!("Removed {}\n", report.name))
                }
                Ok(report) => {
                    ExecResult::caller_error(format!("{} is not installed\n", report.name))
                }
                Err(error) => ExecResult::caller_error(format!("{error}\n")),
            },
            Command::Build {
                skip_typecheck,
                minify,
                tailwind,
                entry,
            } => {
                let options = BuildOptions {
                    entry,
                    skip_typecheck,
                    minify,
                    tailwind,
                };
                match self.build(options).await {
                    Ok(success) => {
                        let mut result = ExecResult::ok(format!(
                            "Built {} ({} module{}, {} bytes)\n",
                            success.entry,
                            success.included_files.len(),
                            if success.included_files.len() == 1 { "" } else { "s" },
                            success.code.len(),
                        ));
                        for warning in &success.warnings {
                            result.stderr.push_str(&format!(
                                "WARNING: {}\n",
                                match (&warning.file, warning.line) {
                                    (Some(file), Some(line)) =>
                                        format!("{file}:{line}: {}", warning.text),
                                    (Some(file), None) => format!("{file}: {}", warning.text),
                                    _ => warning.text.clone(),
                                }
                            ));
                        }
                        result
                    }
                    Err(failure) => render_build_failure(&failure),
                }
            }
            Command::Typecheck { entry } => {
                let outcome = self.typecheck(entry.as_deref()).await;
                if outcome.success {
                    ExecResult::ok("No errors found.\n".to_string())
                } else {
                    ExecResult::pipeline_failure(render_diagnostics(&outcome))
                }
            }
        }
    }
}

fn render_build_failure(failure: &BuildFailure) -> ExecResult {
    match failure {
        BuildFailure::Entry { message } => {
            ExecResult::caller_error(format!("ERROR: {message}\n"))
        }
        BuildFailure::Typecheck { outcome } => {
            ExecResult::pipeline_failure(render_diagnostics(outcome))
        }
        BuildFailure::Bundle { errors } => {
            let mut out = String::new();
            for error in errors {
                out.push_str(&render_bundle_error(error));
            }
            ExecResult::pipeline_failure(out)
        }
        BuildFailure::Load { message } => {
            ExecResult::pipeline_failure(format!("ERROR: load failed: {message}\n"))
        }
        BuildFailure::Validate { message } => {
            ExecResult::pipeline_failure(format!("ERROR: validation failed: {message}\n"))
        }
    }
}

fn render_diagnostics(outcome: &CheckOutcome) -> String {
    let mut out = String::new();
    for diagnostic in &outcome.diagnostics {
        out.push_str(&render_diagnostic(diagnostic));
        out.push('\n');
    }
    out
}

/// `SEVERITY: file:line:col: message`, degrading gracefully when a
/// diagnostic has no position.
fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = diagnostic.severity.as_str().to_uppercase();
    match (&diagnostic.file, diagnostic.line, diagnostic.column) {
        (Some(file), Some(line), Some(column)) => {
            format!("{severity}: {file}:{line}:{column}: {}", diagnostic.message)
        }
        (Some(file), _, _) => format!("{severity}: {file}: {}", diagnostic.message),
        _ => format!("{severity}: {}", diagnostic.message),
    }
}

/// Bundle errors point at the offending source line with a caret.
fn render_bundle_error(error: &BundleError) -> String {
    let mut out = String::new();
    match (&error.file, error.line, error.column) {
        (Some(file), Some(line), Some(column)) => {
            out.push_str(&format!("ERROR: {file}:{line}:{column}: {}\n", error.text));
            if let Some(text) = &error.line_text {
                out.push_str(&format!("  {text}\n"));
                let pad = " ".repeat((column.saturating_sub(1)) as usize);
                out.push_str(&format!("  {pad}^\n"));
            }
        }
        _ => out.push_str(&format!("ERROR: {}\n", error.text)),
    }
    out
}

/// Whitespace splitting with shell-style quoting.
fn split_command(input: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    let mut in_single = false;
    let mut in_double = false;
    let mut pending = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                pending = true;
            }
            '"' if !in_single => {
                in_double = !in_double;
                pending = true;
            }
            '\\' if !in_single => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    pending = true;
                }
            }
            c if c.is_whitespace() && !in_single && !in_double => {
                if pending || !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending || !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::split_command;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(
            split_command("build --minify /index.ts"),
            vec!["build", "--minify", "/index.ts"]
        );
    }

    #[test]
    fn respects_quotes() {
        assert_eq!(
            split_command("install \"@scope/pkg@^1.0 || ^2.0\""),
            vec!["install", "@scope/pkg@^1.0 || ^2.0"]
        );
        assert_eq!(split_command("install 'a b'"), vec!["install", "a b"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(split_command("").is_empty());
        assert!(split_command("   ").is_empty());
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(split_command("install a\\ b"), vec!["install", "a b"]);
    }
}
