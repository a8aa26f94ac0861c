//! `pplmin` — minifies an already-translated PPL program.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use ppl_compiler::minify::minify_program;
use ppl_compiler::DiagnosticCollector;

#[derive(Parser, Debug)]
#[command(
    name = "pplmin",
    version,
    about = "PPL minifier: strips comments and whitespace, shortens names"
)]
struct Cli {
    /// Input program file (UTF-16LE text or hpprgm container)
    input: Option<PathBuf>,

    /// Output file; defaults to <input>-min.hpprgm
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbose flags: a aliases
    #[arg(short = 'v', value_name = "FLAGS")]
    verbose: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    ppl_cli::init_logging(cli.verbose.as_deref());

    let Some(input) = cli.input else {
        ppl_cli::usage_hint("pplmin");
        return;
    };
    if !input.exists() {
        ppl_cli::usage_hint("pplmin");
        return;
    }

    let output = cli.output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        input.with_file_name(format!("{stem}-min.hpprgm"))
    });

    let source = match ppl_container::load_program_text(&input) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("pplmin: {error}");
            return;
        }
    };

    let started = Instant::now();
    let mut diagnostics = DiagnosticCollector::new();
    let minified = match minify_program(&source, &mut diagnostics) {
        Ok(minified) => minified,
        Err(error) => {
            eprintln!("pplmin: {error}");
            return;
        }
    };

    if let Err(error) = ppl_container::write_utf16le_file(&output, &minified) {
        eprintln!("pplmin: {error}");
        return;
    }

    if ppl_cli::report_diagnostics(&diagnostics, false) {
        let _ = fs::remove_file(&output);
        return;
    }

    println!("Completed in {:.2} seconds", started.elapsed().as_secs_f64());

    let original_size = fs::metadata(&input).map(|meta| meta.len()).unwrap_or(0);
    let new_size = fs::metadata(&output).map(|meta| meta.len()).unwrap_or(0);
    if original_size > 0 && new_size <= original_size {
        let saved = original_size - new_size;
        println!(
            "Reduction of {}% or {} bytes.",
            saved * 100 / original_size,
            saved
        );
    }

    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| output.display().to_string());
    println!("UTF-16LE file '{name}' created.");
}
