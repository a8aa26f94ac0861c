//! `pplfmt` — reformats plain PPL source with canonical indentation.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use ppl_compiler::translator::reformat::reformat_program;

#[derive(Parser, Debug)]
#[command(
    name = "pplfmt",
    version,
    about = "PPL reformatter: canonical spacing and depth-based indentation"
)]
struct Cli {
    /// Input program file (UTF-16LE text or hpprgm container)
    input: Option<PathBuf>,

    /// Output file; defaults to the input name with a .ppl extension
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Spaces per indentation level
    #[arg(long = "indent", value_name = "N", default_value_t = 2)]
    indent: usize,
}

fn main() {
    let cli = Cli::parse();
    ppl_cli::init_logging(None);

    let Some(input) = cli.input else {
        ppl_cli::usage_hint("pplfmt");
        return;
    };
    if !input.exists() {
        ppl_cli::usage_hint("pplfmt");
        return;
    }

    let output = cli.output.unwrap_or_else(|| input.with_extension("ppl"));

    let source = match ppl_container::load_program_text(&input) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("pplfmt: {error}");
            return;
        }
    };

    let started = Instant::now();
    let formatted = match reformat_program(&source, cli.indent) {
        Ok(formatted) => formatted,
        Err(error) => {
            eprintln!("pplfmt: {error}");
            return;
        }
    };

    if let Err(error) = ppl_container::write_utf16le_file(&output, &formatted) {
        eprintln!("pplfmt: {error}");
        return;
    }

    println!("Completed in {:.2} seconds", started.elapsed().as_secs_f64());
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| output.display().to_string());
    println!("UTF-16LE file {name} created.");
}
