//! Shared plumbing for the command-line tools.

use log::LevelFilter;

/// Configure logging from the `-v=<flags>` verbose flags: `a` aliases,
/// `p` preprocessor directives, `r` pattern macros, `l` library and
/// include loading.
pub fn init_logging(flags: Option<&str>) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.format_timestamp(None);
    builder.format_target(false);
    if let Some(flags) = flags {
        if flags.contains('a') {
            builder.filter_module("ppl_compiler::aliases", LevelFilter::Debug);
        }
        if flags.contains('p') {
            builder.filter_module("ppl_compiler::directives", LevelFilter::Debug);
        }
        if flags.contains('r') {
            builder.filter_module("ppl_compiler::patterns", LevelFilter::Debug);
        }
        if flags.contains('l') {
            builder.filter_module("ppl_compiler::patterns", LevelFilter::Info);
            builder.filter_module("ppl_compiler::pipeline", LevelFilter::Info);
        }
    }
    let _ = builder.try_init();
}

/// Print the try-`--help` hint. Callers return normally afterwards;
/// the tools always exit 0, even on failure.
pub fn usage_hint(command: &str) {
    println!("{command}: try '{command} --help' for more information");
}

/// Print recorded diagnostics and the end-of-run summary. Returns true
/// when errors were recorded and the output should not survive.
pub fn report_diagnostics(diagnostics: &ppl_compiler::DiagnosticCollector, json: bool) -> bool {
    if json {
        if let Ok(rendered) = serde_json::to_string_pretty(diagnostics.entries()) {
            eprintln!("{rendered}");
        }
    } else {
        for diagnostic in diagnostics.entries() {
            eprintln!("{diagnostic}");
        }
    }
    if diagnostics.has_errors() {
        println!(
            "ERRORS! {} error(s), {} warning(s)",
            diagnostics.error_count(),
            diagnostics.warning_count()
        );
        return true;
    }
    if diagnostics.warning_count() > 0 {
        println!("{} warning(s)", diagnostics.warning_count());
    }
    false
}
