//! `pplplus` — compiles the extended PPL+ dialect down to plain PPL.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser};

use ppl_compiler::{Preferences, SourceProcessor, TranslationSession};

#[derive(Parser, Debug)]
#[command(
    name = "pplplus",
    version,
    about = "PPL+ preprocessor: compiles the extended dialect to plain PPL",
    long_about = "Translates a PPL+ source file to plain PPL. Aliases, pattern macros \
and constant expressions are resolved; includes are expanded; output is written \
as UTF-16LE, optionally wrapped in the hpprgm program container."
)]
struct Cli {
    /// Input source file (.pp / .ppl+ inferred when omitted)
    input: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "out",
        value_name = "FILE",
        long_help = "Output file for the generated PPL code. Defaults to the input \
name with a .ppl extension; a .hpprgm extension selects the program container."
    )]
    output: Option<PathBuf>,

    /// Verbose flags: a aliases, p preprocessor, r patterns, l libraries
    #[arg(short = 'v', value_name = "FLAGS")]
    verbose: Option<String>,

    /// Pattern-macro library and include search root (repeatable)
    #[arg(short = 'I', value_name = "PATH", action = ArgAction::Append)]
    include: Vec<PathBuf>,

    /// Write plain UTF-16LE even for a .hpprgm output name
    #[arg(long = "utf16-le")]
    utf16le: bool,

    /// Print the full output path on success
    #[arg(long = "path")]
    show_path: bool,

    /// Emit diagnostics as JSON on stderr
    #[arg(long = "json")]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    ppl_cli::init_logging(cli.verbose.as_deref());

    let Some(mut input) = cli.input else {
        ppl_cli::usage_hint("pplplus");
        return;
    };

    if !input.exists() {
        for extension in ["pp", "ppl+"] {
            let candidate = input.with_extension(extension);
            if candidate.exists() {
                input = candidate;
                break;
            }
        }
    }
    if !input.exists() {
        ppl_cli::usage_hint("pplplus");
        return;
    }

    let output = cli.output.unwrap_or_else(|| input.with_extension("ppl"));
    let as_container = output
        .extension()
        .is_some_and(|extension| extension == "hpprgm")
        && !cli.utf16le;

    let mut session = TranslationSession::new(Preferences::default());
    session.directives.include_paths = cli.include.clone();
    session.define_builtin_macros();
    for root in &cli.include {
        session
            .patterns
            .load_library_dir(root, &session.scope, &mut session.diagnostics);
    }

    let started = Instant::now();
    let mut processor = SourceProcessor::new(&mut session);
    let translated = match processor.process_file(&input) {
        Ok(()) => processor.into_output(),
        Err(error) => {
            eprintln!("pplplus: {error}");
            return;
        }
    };

    let written = if as_container {
        ppl_container::write_container_file(&output, &translated)
    } else {
        ppl_container::write_utf16le_file(&output, &translated)
    };
    if let Err(error) = written {
        eprintln!("pplplus: {error}");
        return;
    }

    if ppl_cli::report_diagnostics(&session.diagnostics, cli.json) {
        let _ = fs::remove_file(&output);
        return;
    }

    println!("Completed in {:.2} seconds", started.elapsed().as_secs_f64());
    if cli.show_path {
        println!("UTF-16LE file at \"{}\" created.", output.display());
    } else {
        let name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| output.display().to_string());
        println!("UTF-16LE file {name} created.");
    }
}
