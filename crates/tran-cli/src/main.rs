//! Tran CLI
//!
//! Command-line interface for the Tran language.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{NamedSource, Report};
use tran_core::diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, DiagnosticsOutput};
use tran_core::{find_entry, lex, parse_source, run_with, Error, StdoutHost, TranConfig};

#[derive(Parser)]
#[command(name = "tran")]
#[command(author, version, about = "Run and inspect Tran programs", long_about = None)]
struct Cli {
    /// Log interpreter activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Tran program
    Run {
        /// Path to the .tran file
        file: String,

        /// Directory holding tran.toml (defaults to the file's directory)
        #[arg(short, long)]
        project: Option<String>,

        /// Deepest allowed call nesting
        #[arg(long)]
        max_depth: Option<usize>,

        /// Name of the shared entry method
        #[arg(long)]
        entry: Option<String>,
    },

    /// Lex and parse a program without running it
    Check {
        /// Path to the .tran file
        file: String,

        /// Directory holding tran.toml (defaults to the file's directory)
        #[arg(short, long)]
        project: Option<String>,

        /// Output format (human, json)
        #[arg(short, long, default_value = "human")]
        format: String,
    },

    /// Print the token stream of a file (for debugging)
    Lex {
        /// Path to the .tran file
        file: String,
    },

    /// Parse a file and print the AST as JSON (for debugging)
    Parse {
        /// Path to the .tran file
        file: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            file,
            project,
            max_depth,
            entry,
        } => cmd_run(&file, project.as_deref(), max_depth, entry),
        Commands::Check {
            file,
            project,
            format,
        } => cmd_check(&file, project.as_deref(), &format),
        Commands::Lex { file } => cmd_lex(&file),
        Commands::Parse { file } => cmd_parse(&file),
    }
}

/// Install a stderr subscriber when `RUST_LOG` is set or `--verbose` is passed.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("tran_core=debug,tran=debug")
    } else {
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn read_source(file: &str) -> Result<String, ExitCode> {
    fs::read_to_string(file).map_err(|e| {
        eprintln!("{} Failed to read file '{}': {}", "error:".red().bold(), file, e);
        ExitCode::from(2)
    })
}

fn load_config(file: &str, project: Option<&str>) -> Result<TranConfig, ExitCode> {
    let dir = match project {
        Some(dir) => PathBuf::from(dir),
        None => Path::new(file)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    TranConfig::discover(&dir).map_err(|e| {
        eprintln!("{:?}", Report::new(e));
        ExitCode::from(2)
    })
}

/// Render a language error with its source excerpt.
fn report(error: Error, file: &str, source: &str) {
    let report = Report::new(error).with_source_code(NamedSource::new(file, source.to_string()));
    eprintln!("{:?}", report);
}

fn cmd_run(file: &str, project: Option<&str>, max_depth: Option<usize>, entry: Option<String>) -> ExitCode {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let config = match load_config(file, project) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut options = config.run;
    if let Some(depth) = max_depth {
        options.max_call_depth = depth;
    }
    if let Some(entry) = entry {
        options.entry = entry;
    }
    tracing::debug!(file, ?options, "running program");

    let unit = match parse_source(&source) {
        Ok(unit) => unit,
        Err(e) => {
            report(e, file, &source);
            return ExitCode::from(1);
        }
    };

    let mut host = StdoutHost;
    match run_with(&unit, &mut host, options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(e, file, &source);
            ExitCode::from(1)
        }
    }
}

fn cmd_check(file: &str, project: Option<&str>, format: &str) -> ExitCode {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let config = match load_config(file, project) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut diagnostics = Diagnostics::new();
    let mut failure = None;
    match parse_source(&source) {
        Ok(unit) => {
            if let Err(e) = find_entry(&unit, &config.run.entry) {
                diagnostics.push(
                    Diagnostic::warning("tran::entry", e.message())
                        .with_file(file)
                        .with_help("`tran run` needs exactly one shared, parameterless entry method")
                        .build(),
                );
            }
        }
        Err(e) => {
            diagnostics.push(Diagnostic::from_error(&e, file));
            failure = Some(e);
        }
    }

    match format {
        "json" => match DiagnosticsOutput::from_diagnostics(&diagnostics).to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{} Failed to serialize diagnostics: {}", "error:".red().bold(), e);
                return ExitCode::from(2);
            }
        },
        _ => {
            for diag in diagnostics.warnings() {
                print_diagnostic(diag);
            }
            if let Some(e) = failure {
                report(e, file, &source);
                eprintln!(
                    "{}: could not validate `{}` due to previous error",
                    "error".red().bold(),
                    file
                );
            } else {
                let warning_count = diagnostics.warnings().count();
                if warning_count > 0 {
                    println!(
                        "{} `{}` validated with {} warning{}",
                        "Finished".green().bold(),
                        file,
                        warning_count,
                        if warning_count == 1 { "" } else { "s" }
                    );
                } else {
                    println!("{} `{}` validated successfully", "Finished".green().bold(), file);
                }
            }
        }
    }

    if diagnostics.has_errors() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn print_diagnostic(diag: &Diagnostic) {
    let severity = match diag.severity {
        DiagnosticSeverity::Error => "error".red().bold(),
        DiagnosticSeverity::Warning => "warning".yellow().bold(),
    };
    println!(
        "{}{}{} {}",
        severity,
        format!("[{}]", diag.code).dimmed(),
        ":".bold(),
        diag.message
    );
    match diag.span {
        Some(span) => println!("  {} {}:{}", "-->".blue().bold(), diag.file, span),
        None => println!("  {} {}", "-->".blue().bold(), diag.file),
    }
    if let Some(ref help) = diag.help {
        println!("   {} {}: {}", "=".blue().bold(), "help".bold(), help);
    }
    println!();
}

fn cmd_lex(file: &str) -> ExitCode {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match lex(&source) {
        Ok(tokens) => {
            for token in &tokens {
                println!("{}:{} {} {:?}", token.line(), token.column(), token.kind, token.text);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(e, file, &source);
            ExitCode::from(1)
        }
    }
}

fn cmd_parse(file: &str) -> ExitCode {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let unit = match parse_source(&source) {
        Ok(unit) => unit,
        Err(e) => {
            report(e, file, &source);
            return ExitCode::from(1);
        }
    };

    match serde_json::to_string_pretty(&unit) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} Failed to serialize AST: {}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}
