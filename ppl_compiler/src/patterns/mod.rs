//! User-declared pattern macros.
//!
//! A pattern macro is a generalized search/replace rule with its own
//! scope lifetime, declared inline with
//! ``regex [@]`pattern` replacement`` or loaded from a library file.
//! Patterns are kept separate from the alias table because they may
//! match arbitrary context, not just bare identifiers.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::calc;
use crate::config::constants::{BASE_LIBRARY_NAME, LIBRARY_EXTENSION};
use crate::diagnostics::DiagnosticCollector;
use crate::error::{context_snippet, fixpoint_pass_limit, StructuralError};
use crate::session::ScopeTracker;

/// Marker token in replacement templates that expands to the current
/// nesting depth.
const SCOPE_MARKER: &str = "__SCOPE__";

/// One live search/replace rule.
#[derive(Debug)]
pub struct PatternMacro {
    pub pattern: String,
    pub replacement: String,
    /// Depth the rule was defined at; 0 for `@`-forced global rules.
    pub depth: usize,
    pub path: Option<PathBuf>,
    pub line: u32,
    compiled: Regex,
}

/// Ordered store of pattern macros, resolved in insertion order.
#[derive(Debug, Default)]
pub struct PatternLibrary {
    patterns: Vec<PatternMacro>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognize and consume a pattern-macro definition line. Returns
    /// false when the line is not a definition; the caller keeps
    /// translating it. A consumed line must not be translated further.
    pub fn parse(
        &mut self,
        line: &str,
        scope: &ScopeTracker,
        diagnostics: &mut DiagnosticCollector,
    ) -> bool {
        let re = Regex::new(r"^\s*regex\s+(@)?`([^`]*)`\s*(.*)$").expect("definition pattern");
        let Some(captures) = re.captures(line) else {
            return false;
        };

        let force_global = captures.get(1).is_some();
        let pattern = captures[2].to_string();
        let replacement = captures[3].to_string();

        if let Some(previous) = self.find(&pattern) {
            let site = match &previous.path {
                Some(path) => format!("{}:{}", path.display(), previous.line),
                None => format!("line {}", previous.line),
            };
            diagnostics.warning(
                format!("pattern already defined, previous definition at {site}"),
                scope.current_path(),
                scope.current_line(),
            );
            return true;
        }

        let compiled = match Regex::new(&pattern) {
            Ok(compiled) => compiled,
            Err(error) => {
                diagnostics.warning(
                    format!("invalid pattern `{pattern}`: {error}"),
                    scope.current_path(),
                    scope.current_line(),
                );
                return true;
            }
        };

        let depth = if force_global { 0 } else { scope.depth() };
        log::debug!(
            target: "ppl_compiler::patterns",
            "defined {}pattern `{}`",
            if depth > 0 { "local " } else { "" },
            pattern
        );
        self.patterns.push(PatternMacro {
            pattern,
            replacement,
            depth,
            path: scope.current_path().map(|p| p.to_path_buf()),
            line: scope.current_line(),
            compiled,
        });
        true
    }

    /// Apply every live pattern to `text`, restarting from the first
    /// pattern after each substitution so one macro's output can
    /// trigger another's match. Replacement templates may embed a
    /// depth marker and arithmetic; both are resolved after each
    /// substitution. The restart count is bounded.
    pub fn resolve_all(
        &self,
        text: &str,
        depth: usize,
        diagnostics: &mut DiagnosticCollector,
    ) -> Result<String, StructuralError> {
        if text.is_empty() || self.patterns.is_empty() {
            return Ok(text.to_string());
        }

        let limit = fixpoint_pass_limit(text.len());
        let mut current = text.to_string();
        for _ in 0..limit {
            let mut changed = false;
            for rule in &self.patterns {
                if !rule.compiled.is_match(&current) {
                    continue;
                }
                current = rule
                    .compiled
                    .replace_all(&current, rule.replacement.as_str())
                    .into_owned();
                if current.contains(SCOPE_MARKER) {
                    current = current.replace(SCOPE_MARKER, &depth.to_string());
                }
                calc::evaluate_math_expression(&mut current, diagnostics);
                changed = true;
                break;
            }
            if !changed {
                return Ok(current);
            }
        }
        Err(StructuralError::FixpointOverflow {
            limit,
            context: context_snippet(text),
        })
    }

    /// Delete every pattern defined deeper than the current depth;
    /// called when a block closes.
    pub fn remove_all_out_of_scope(&mut self, depth: usize) {
        self.patterns.retain(|rule| {
            let keep = rule.depth <= depth;
            if !keep {
                log::debug!(
                    target: "ppl_compiler::patterns",
                    "removed local pattern `{}`",
                    rule.pattern
                );
            }
            keep
        });
    }

    pub fn pattern_exists(&self, pattern: &str) -> bool {
        self.find(pattern).is_some()
    }

    /// True when `name` appears in any live pattern or replacement;
    /// used to keep synthetic names from colliding with rule text.
    pub fn mentions(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .any(|rule| rule.pattern.contains(name) || rule.replacement.contains(name))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn find(&self, pattern: &str) -> Option<&PatternMacro> {
        self.patterns.iter().find(|rule| rule.pattern == pattern)
    }

    /// Load one library file: one `pattern replacement` definition per
    /// line, each auto-prefixed with the defining keyword.
    pub fn load_library_file(
        &mut self,
        path: &Path,
        scope: &ScopeTracker,
        diagnostics: &mut DiagnosticCollector,
    ) -> bool {
        let Ok(contents) = fs::read_to_string(path) else {
            return false;
        };
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            self.parse(&format!("regex {line}"), scope, diagnostics);
        }
        log::info!(
            target: "ppl_compiler::patterns",
            "library {} loaded",
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        );
        true
    }

    /// Load every library file in `dir`, the base library first.
    /// A missing directory is only a verbose-level notice.
    pub fn load_library_dir(
        &mut self,
        dir: &Path,
        scope: &ScopeTracker,
        diagnostics: &mut DiagnosticCollector,
    ) {
        self.load_library_file(&dir.join(BASE_LIBRARY_NAME), scope, diagnostics);

        let Ok(entries) = fs::read_dir(dir) else {
            log::debug!(target: "ppl_compiler::patterns", "no library directory at {}", dir.display());
            return;
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == LIBRARY_EXTENSION)
                    && path
                        .file_name()
                        .is_none_or(|name| name != BASE_LIBRARY_NAME)
            })
            .collect();
        paths.sort();
        for path in paths {
            self.load_library_file(&path, scope, diagnostics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scoped(depth: usize) -> ScopeTracker {
        let mut scope = ScopeTracker::new();
        scope.push_file(Path::new("main.ppl+"));
        for _ in 0..depth {
            scope.enter_block();
        }
        scope
    }

    #[test]
    fn parses_and_consumes_definitions() {
        let mut library = PatternLibrary::new();
        let mut diagnostics = DiagnosticCollector::new();
        let scope = scoped(0);
        assert!(library.parse("regex `\\bDISP\\b` PRINT", &scope, &mut diagnostics));
        assert!(!library.parse("A:=1;", &scope, &mut diagnostics));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn duplicate_pattern_is_rejected_with_site() {
        let mut library = PatternLibrary::new();
        let mut diagnostics = DiagnosticCollector::new();
        let scope = scoped(0);
        assert!(library.parse("regex `foo` bar", &scope, &mut diagnostics));
        assert!(library.parse("regex `foo` baz", &scope, &mut diagnostics));
        assert_eq!(library.len(), 1);
        assert!(diagnostics.entries()[0]
            .message
            .contains("previous definition at main.ppl+:1"));
    }

    #[test]
    fn resolves_with_capture_groups() {
        let mut library = PatternLibrary::new();
        let mut diagnostics = DiagnosticCollector::new();
        let scope = scoped(0);
        library.parse(
            r"regex `incr +([A-Za-z]\w*)` $1:=$1+1",
            &scope,
            &mut diagnostics,
        );
        let resolved = library.resolve_all("incr counter", 0, &mut diagnostics).unwrap();
        assert_eq!(resolved, "counter:=counter+1");
    }

    #[test]
    fn scope_marker_expands_to_depth() {
        let mut library = PatternLibrary::new();
        let mut diagnostics = DiagnosticCollector::new();
        let scope = scoped(0);
        library.parse("regex `here` depth __SCOPE__;", &scope, &mut diagnostics);
        let resolved = library.resolve_all("here", 3, &mut diagnostics).unwrap();
        assert_eq!(resolved, "depth 3;");
    }

    #[test]
    fn global_marker_survives_block_close() {
        let mut library = PatternLibrary::new();
        let mut diagnostics = DiagnosticCollector::new();
        let scope = scoped(2);
        library.parse("regex @`keep` KEPT", &scope, &mut diagnostics);
        library.parse("regex `drop` DROPPED", &scope, &mut diagnostics);

        library.remove_all_out_of_scope(0);
        assert!(library.pattern_exists("keep"));
        assert!(!library.pattern_exists("drop"));
    }

    #[test]
    fn one_macro_output_triggers_another() {
        let mut library = PatternLibrary::new();
        let mut diagnostics = DiagnosticCollector::new();
        let scope = scoped(0);
        library.parse("regex `stage2` done", &scope, &mut diagnostics);
        library.parse("regex `stage1` stage2", &scope, &mut diagnostics);
        let resolved = library.resolve_all("stage1", 0, &mut diagnostics).unwrap();
        assert_eq!(resolved, "done");
    }

    #[test]
    fn loads_library_files_with_auto_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphics.re");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "`\\bCLS\\b` RECT()").unwrap();
        drop(file);

        let mut library = PatternLibrary::new();
        let mut diagnostics = DiagnosticCollector::new();
        let scope = scoped(0);
        library.load_library_dir(dir.path(), &scope, &mut diagnostics);
        assert_eq!(library.len(), 1);
        let resolved = library.resolve_all("CLS", 0, &mut diagnostics).unwrap();
        assert_eq!(resolved, "RECT()");
    }
}
