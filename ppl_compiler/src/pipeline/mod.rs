//! File-level translation: include recursion, pass-through blocks and
//! logical-line assembly.
//!
//! Files are drained depth-first: an include is fully translated,
//! nested includes and all, before the including file resumes. All
//! translated text accumulates in one output buffer; the caller checks
//! the session's diagnostics afterwards to decide whether the output
//! survives.

mod error;

pub use error::PipelineError;

use std::path::{Path, PathBuf};

use crate::config::constants::MAX_INCLUDE_DEPTH;
use crate::directives;
use crate::session::TranslationSession;
use crate::translator;

/// Drives one translation run over a root file and its includes.
pub struct SourceProcessor<'s> {
    session: &'s mut TranslationSession,
    output: String,
    include_depth: usize,
    main_source_dir: Option<PathBuf>,
}

impl<'s> SourceProcessor<'s> {
    pub fn new(session: &'s mut TranslationSession) -> Self {
        Self {
            session,
            output: String::new(),
            include_depth: 0,
            main_source_dir: None,
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    /// Translate `path` and everything it includes, appending to the
    /// output buffer.
    pub fn process_file(&mut self, path: &Path) -> Result<(), PipelineError> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            self.session.diagnostics.error(
                format!("include nesting exceeds {MAX_INCLUDE_DEPTH}"),
                self.session.scope.current_path(),
                self.session.scope.current_line(),
            );
            return Ok(());
        }

        let text = ppl_container::load_program_text(path)?;
        if self.main_source_dir.is_none() {
            self.main_source_dir = path.parent().map(Path::to_path_buf);
        }

        self.session.scope.push_file(path);
        self.include_depth += 1;
        let result = self.process_text(&text);
        self.include_depth -= 1;
        self.session.scope.pop_file();
        result
    }

    /// Translate in-memory source under a pseudo filename. Used for
    /// testing and for stdin-style invocations.
    pub fn process_source(&mut self, name: &str, source: &str) -> Result<(), PipelineError> {
        self.session.scope.push_file(Path::new(name));
        let result = self.process_text(source);
        self.session.scope.pop_file();
        result
    }

    fn process_text(&mut self, text: &str) -> Result<(), PipelineError> {
        let lines: Vec<&str> = text.lines().collect();
        let mut index = 0;

        while index < lines.len() {
            let mut raw = lines[index].to_string();

            // A trailing backslash joins the next physical line.
            while raw.ends_with('\\') && index + 1 < lines.len() {
                raw.pop();
                index += 1;
                self.session.scope.increment_line();
                let continuation = lines[index];
                raw.push_str(continuation);
                if continuation.is_empty() {
                    break;
                }
            }

            if directives::is_exit(&raw) {
                break;
            }

            if self.session.directives.disregard() {
                self.session.directives.parse(
                    &raw,
                    &mut self.session.aliases,
                    &self.session.scope,
                    &mut self.session.diagnostics,
                );
                self.advance(&mut index);
                continue;
            }

            if directives::is_python_block(&raw) {
                self.advance(&mut index);
                self.copy_block(&lines, &mut index, true);
                continue;
            }

            if directives::is_ppl_block(&raw) {
                self.advance(&mut index);
                self.copy_block(&lines, &mut index, false);
                continue;
            }

            if let Some(canonical) = directives::parse_pragma_mode(
                &raw,
                &mut self.session.prefs,
                &self.session.scope,
                &mut self.session.diagnostics,
            ) {
                self.output.push_str(&canonical);
                self.output.push('\n');
                self.advance(&mut index);
                continue;
            }

            if directives::is_quoted_include(&raw) {
                self.advance(&mut index);
                self.quoted_include(&raw)?;
                continue;
            }

            if directives::is_angle_include(&raw) {
                self.advance(&mut index);
                self.angle_include(&raw)?;
                continue;
            }

            let split = translator::split_structural(&raw);
            for part in split.split('\n') {
                let translated = translator::translate_line(part, self.session)?;
                self.output.push_str(&translated);
            }
            self.advance(&mut index);
        }

        Ok(())
    }

    fn advance(&mut self, index: &mut usize) {
        self.session.scope.increment_line();
        *index += 1;
    }

    /// Copy a `#PYTHON`/`#PPL` block through untranslated. Python
    /// blocks keep their fences; the calculator needs them.
    fn copy_block(&mut self, lines: &[&str], index: &mut usize, keep_fences: bool) {
        if keep_fences {
            self.output.push_str("#PYTHON\n");
        }
        while *index < lines.len() {
            let line = lines[*index];
            if directives::is_block_end(line) {
                self.advance(index);
                break;
            }
            self.output.push_str(line);
            self.output.push('\n');
            self.advance(index);
        }
        if keep_fences {
            self.output.push_str("#END\n");
        }
    }

    fn quoted_include(&mut self, line: &str) -> Result<(), PipelineError> {
        let Some(filename) = directives::extract_include_filename(line) else {
            return Ok(());
        };

        let mut path = PathBuf::from(&filename);
        if path.parent().is_none_or(|p| p.as_os_str().is_empty()) && !path.exists() {
            if let Some(dir) = &self.main_source_dir {
                path = dir.join(&filename);
            }
        }

        // Already-translated program files are embedded verbatim.
        let extension = path.extension().and_then(|ext| ext.to_str());
        if matches!(extension, Some("hpprgm") | Some("ppl")) {
            match ppl_container::load_program_text(&path) {
                Ok(code) => {
                    self.output.push_str(&code);
                    if !code.ends_with('\n') {
                        self.output.push('\n');
                    }
                }
                Err(_) => {
                    log::info!(target: "ppl_compiler::pipeline", "{filename} file not found");
                }
            }
            return Ok(());
        }

        if !path.exists() {
            log::info!(target: "ppl_compiler::pipeline", "{filename} file not found");
            return Ok(());
        }
        self.process_file(&path)
    }

    fn angle_include(&mut self, line: &str) -> Result<(), PipelineError> {
        let Some(mut filename) = directives::extract_include_filename(line) else {
            return Ok(());
        };
        if PathBuf::from(&filename).extension().is_none() {
            filename.push_str(".ppl+");
        }

        let found = self
            .session
            .directives
            .include_paths
            .iter()
            .map(|root| root.join(&filename))
            .find(|candidate| candidate.exists());

        match found {
            Some(path) => self.process_file(&path),
            None => {
                log::info!(target: "ppl_compiler::pipeline", "{filename} file not found");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preferences;
    use std::io::Write;

    fn run(source: &str) -> (String, bool) {
        let mut session = TranslationSession::new(Preferences::default());
        session.define_builtin_macros();
        let mut processor = SourceProcessor::new(&mut session);
        processor.process_source("main.ppl+", source).unwrap();
        let output = processor.into_output();
        (output, session.diagnostics.has_errors())
    }

    #[test]
    fn translates_a_small_program() {
        let source = "export run()\nbegin\nx:=1;\nend;\n";
        let (output, failed) = run(source);
        assert!(!failed);
        assert!(output.contains("EXPORT run()"));
        assert!(output.contains("BEGIN"));
        assert!(output.contains("END;"));
    }

    #[test]
    fn exit_stops_the_file() {
        let (output, _) = run("A:=1;\n#EXIT\nB:=2;\n");
        assert!(output.contains('A'));
        assert!(!output.contains('B'));
    }

    #[test]
    fn inactive_branch_is_skipped() {
        let source = "#ifdef MISSING\nA:=1;\n#else\nB:=2;\n#endif\n";
        let (output, _) = run(source);
        assert!(!output.contains('A'));
        assert!(output.contains('B'));
    }

    #[test]
    fn python_block_passes_through_with_fences() {
        let source = "#PYTHON\nprint( 1+1 )\n#END\n";
        let (output, _) = run(source);
        assert_eq!(output, "#PYTHON\nprint( 1+1 )\n#END\n");
    }

    #[test]
    fn ppl_block_drops_its_fences() {
        let source = "#PPL\nRECT_P(0,0);\n#END\n";
        let (output, _) = run(source);
        assert_eq!(output, "RECT_P(0,0);\n");
    }

    #[test]
    fn continuation_lines_join() {
        let (output, _) = run("A:=1+\\\n2;\n");
        assert!(output.contains("A := 1 + 2;"));
    }

    #[test]
    fn pragma_mode_switches_assignment_style() {
        let source = "#pragma mode( assignment(:=) )\nA=1;\n";
        let (output, _) = run(source);
        // With := as the declared source spelling, a bare = is equality.
        assert!(output.contains("A == 1;"));
    }

    #[test]
    fn quoted_include_pulls_translated_file(){
        let dir = tempfile::tempdir().unwrap();
        let included = dir.path().join("util.ppl+");
        let mut file = std::fs::File::create(&included).unwrap();
        writeln!(file, "alias speed:=S;").unwrap();
        drop(file);

        let root = dir.path().join("main.ppl+");
        let mut file = std::fs::File::create(&root).unwrap();
        writeln!(file, "#include \"util.ppl+\"").unwrap();
        writeln!(file, "speed:=9;").unwrap();
        drop(file);

        let mut session = TranslationSession::new(Preferences::default());
        let mut processor = SourceProcessor::new(&mut session);
        processor.process_file(&root).unwrap();
        assert!(processor.output().contains("S := 9;"));
    }

    #[test]
    fn missing_include_is_skipped_without_error() {
        let (output, failed) = run("#include \"nowhere.ppl+\"\nA:=1;\n");
        assert!(!failed);
        assert!(output.contains("A := 1;"));
    }
}
