use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use rlox::{diagnostics_json, Lox, RunError, EXIT_IO, EXIT_USAGE};
use rlox_types::printer::print_program;
use rlox_types::SourceFile;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "rlox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lox tree-walking interpreter", long_about = None)]
struct Args {
    /// Script to run. Starts a REPL when omitted.
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Print static diagnostics as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Print the parsed program before running it.
    #[arg(long = "print-ast")]
    print_ast: bool,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match &args.script {
        Some(path) => run_file(path, &args),
        None => run_prompt(&args),
    }
}

fn run_file(path: &Path, args: &Args) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("rlox: can't read {}: {e}", path.display());
            return ExitCode::from(EXIT_IO);
        }
    };

    let mut lox = Lox::new();
    match run_source(&mut lox, &source, &path.display().to_string(), args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, args);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run_prompt(args: &Args) -> ExitCode {
    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let prompted = {
            let mut out = io::stdout().lock();
            write!(out, "> ").and_then(|()| out.flush())
        };
        if prompted.is_err() {
            return ExitCode::from(EXIT_IO);
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("rlox: {e}");
                return ExitCode::from(EXIT_IO);
            }
            None => break,
        };
        // Errors are per line; the session carries on.
        if let Err(err) = run_source(&mut lox, &line, "<repl>", args) {
            report(&err, args);
        }
    }
    if writeln!(io::stdout().lock()).is_err() {
        return ExitCode::from(EXIT_IO);
    }
    ExitCode::SUCCESS
}

fn run_source(lox: &mut Lox, source: &str, name: &str, args: &Args) -> Result<(), RunError> {
    let compiled = lox.compile(&SourceFile::new(name, source))?;
    if args.print_ast && !compiled.program.is_empty() {
        // A closed stdout surfaces again on the first `print`.
        let _ = writeln!(io::stdout().lock(), "{}", print_program(&compiled.program));
    }
    debug!(file = name, statements = compiled.program.len(), "executing");
    lox.execute(compiled)
}

fn report(err: &RunError, args: &Args) {
    match err {
        RunError::Static(errors) if args.json => {
            let _ = writeln!(io::stdout().lock(), "{}", diagnostics_json(errors));
        }
        RunError::Static(errors) => eprint!("{errors}"),
        RunError::Runtime(_) => eprintln!("{err}"),
    }
}
