use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::Level;

use tinyscript::CompileError;
use tinyscript::ast::{Program, printer};
use tinyscript::interpreter::Interpreter;
use tinyscript::parser::Parser as ScriptParser;
use tinyscript::scanner;
use tinyscript::scanner::token::Token;

#[derive(Parser, Debug)]
#[command(
    name = "tinyscript",
    version,
    about = "A tree-walking interpreter for a tiny scripting language"
)]
struct Cli {
    /// Source file to run
    file: PathBuf,

    /// Dump tokens and exit
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST and exit
    #[arg(long)]
    dump_ast: bool,

    /// AST output format
    #[arg(long, value_enum, default_value_t = AstFormat::Sexp)]
    ast_format: AstFormat,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AstFormat {
    Sexp,
    Json,
}

/// Failure whose details have already been written to stderr.
#[derive(Debug, thiserror::Error)]
#[error("{0} error(s) reported")]
struct Reported(usize);

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("read source file '{}'", path.display()))
}

fn report_compile_errors(errors: Vec<CompileError>, name: &str, source: &str) -> anyhow::Error {
    let count = errors.len();
    for e in errors {
        let report = miette::Report::new(e.with_source_code(name, source));
        eprintln!("{report:?}");
    }
    Reported(count).into()
}

fn scan(name: &str, source: &str) -> Result<Vec<Token>> {
    scanner::scan(source).map_err(|errors| report_compile_errors(errors, name, source))
}

fn parse(name: &str, source: &str) -> Result<Program> {
    let tokens = scan(name, source)?;
    ScriptParser::new(tokens, name)
        .parse()
        .map_err(|e| report_compile_errors(vec![e], name, source))
}

fn run(cli: &Cli) -> Result<()> {
    let source = read_source(&cli.file)?;
    let name = cli.file.display().to_string();

    if cli.dump_tokens {
        for token in scan(&name, &source)? {
            println!("{token}");
        }
        return Ok(());
    }

    let program = parse(&name, &source)?;

    if cli.dump_ast {
        match cli.ast_format {
            AstFormat::Json => {
                println!("{}", printer::to_json(&program).context("serialize AST to JSON")?)
            }
            AstFormat::Sexp => print!("{}", printer::to_sexp(&program)),
        }
        return Ok(());
    }

    let mut interpreter = Interpreter::new();
    interpreter.interpret(&program).map_err(|e| {
        eprintln!("{}", e.display_with_line(&source));
        anyhow::Error::from(Reported(1))
    })
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is::<Reported>() => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
