//! # Groundlog CLI
//!
//! Batch entry point: read one Datalog file, evaluate it, print the
//! report.
//!
//! ## Usage
//!
//! ```bash
//! # Evaluate a program (dependency graph, rule passes, query results)
//! groundlog program.dl
//!
//! # Whole-program fixed point without the dependency analysis
//! groundlog --no-optimize program.dl
//!
//! # Dump the token stream and exit
//! groundlog --tokens program.dl
//!
//! # Parse only and print the program summary
//! groundlog --ast program.dl
//! ```
//!
//! Exits 0 on success (even when every query answers `No`), 1 on a parse
//! failure after printing the two-line `Failure!` report, and 2 when the
//! input file or configuration cannot be read at all.

use anyhow::Context;
use clap::Parser as ClapParser;
use groundlog::{lexer, parser, Config, Interpreter, TokenKind};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, ClapParser)]
#[command(name = "groundlog", version, about = "Bottom-up Datalog interpreter")]
struct Args {
    /// Datalog source file to evaluate
    file: PathBuf,

    /// Configuration file (defaults to groundlog.toml discovery)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Iterate the whole rule list instead of evaluating component by
    /// component
    #[arg(long)]
    no_optimize: bool,

    /// Dump the token stream and exit without evaluating
    #[arg(long)]
    tokens: bool,

    /// Parse only: print the program summary and exit without evaluating
    #[arg(long)]
    ast: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(&path.to_string_lossy())
            .with_context(|| format!("cannot load configuration from {}", path.display()))?,
        None => Config::load().context("cannot load configuration")?,
    };
    init_logging(&config)?;

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;

    if args.tokens {
        print_tokens(&source);
        return Ok(ExitCode::SUCCESS);
    }

    let program = match parser::parse(&source) {
        Ok(program) => program,
        Err(err) => {
            println!("{}", err.report());
            return Ok(ExitCode::from(1));
        }
    };

    if args.ast {
        print!("Success!\n{}", program.summary());
        return Ok(ExitCode::SUCCESS);
    }

    let mut interpreter = match Interpreter::new(program) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            println!("{}", err.report());
            return Ok(ExitCode::from(1));
        }
    };

    let optimize = config.evaluation.optimize && !args.no_optimize;
    let report = if optimize {
        interpreter.run_optimized()
    } else {
        interpreter.run_fixed_point()
    };
    print!("{report}");
    Ok(ExitCode::SUCCESS)
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid logging level")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Lab-style token dump: every token except whitespace, then a count.
fn print_tokens(source: &str) {
    let tokens: Vec<_> = lexer::scan(source)
        .into_iter()
        .filter(|token| token.kind != TokenKind::Whitespace)
        .collect();
    for token in &tokens {
        println!("{token}");
    }
    println!("Total Tokens = {}", tokens.len());
}
