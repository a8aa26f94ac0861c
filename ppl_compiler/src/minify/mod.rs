//! Source minification for already-translated programs.
//!
//! The minifier strips comments, collapses whitespace and renames
//! variables, parameters and top-level functions to allocator short
//! names, reusing the alias table for the renaming so every later use
//! follows the declaration.

use regex::Regex;

use crate::aliases::{AliasTable, Identity, IdentityKind, IdentityScope, NameAllocator};
use crate::diagnostics::DiagnosticCollector;
use crate::error::StructuralError;
use crate::patterns::PatternLibrary;
use crate::session::ScopeTracker;
use crate::text::{self, ProtectedStrings};
use crate::translator::keywords::{alternation, BLOCK_CLOSERS, BLOCK_OPENERS};

/// Names shorter than this are not worth renaming.
const MIN_RENAME_LENGTH: usize = 3;

struct Minifier {
    aliases: AliasTable,
    scope: ScopeTracker,
    allocator: NameAllocator,
    /// Collision checks go through the allocator's pattern probe; the
    /// minifier defines no patterns, so this stays empty.
    patterns: PatternLibrary,
    output: String,
}

/// Minify a plain translated program.
pub fn minify_program(
    source: &str,
    diagnostics: &mut DiagnosticCollector,
) -> Result<String, StructuralError> {
    let mut minifier = Minifier {
        aliases: AliasTable::new(),
        scope: ScopeTracker::new(),
        allocator: NameAllocator::new(),
        patterns: PatternLibrary::new(),
        output: String::new(),
    };

    // Conditionals and loop bodies must start on their own line so the
    // scope scan below sees one structure per line.
    let mut text = source.to_string();
    text = Regex::new(r"\b(THEN|DO|REPEAT)\b")
        .expect("split after")
        .replace_all(&text, "$1\n")
        .into_owned();
    text = Regex::new(r"\b(LOCAL|CASE|IF)\b")
        .expect("split before")
        .replace_all(&text, "\n$1")
        .into_owned();
    text = Regex::new(r"\bEND;")
        .expect("split end")
        .replace_all(&text, "\nEND;")
        .into_owned();

    for line in text.lines() {
        minifier.minify_line(line, diagnostics)?;
    }
    Ok(minifier.output)
}

impl Minifier {
    fn minify_line(
        &mut self,
        line: &str,
        diagnostics: &mut DiagnosticCollector,
    ) -> Result<(), StructuralError> {
        let mut strings = ProtectedStrings::new();
        let mut ln = line.to_string();
        strings.preserve(&ln)?;
        strings.blank_out(&mut ln)?;

        if let Some(index) = ln.find("//") {
            ln.truncate(index);
        }

        ln = text::normalize_whitespace(&ln);
        ln = ln.trim().to_string();
        if ln.is_empty() {
            return Ok(());
        }

        ln = text::remove_whitespace_around_operators(&ln);
        ln = ln.replace(">=", "≥");
        ln = ln.replace("<=", "≤");
        ln = ln.replace("<>", "≠");
        ln = ln.replace("==", "=");

        self.track_scope(&ln);

        if self.scope.depth() == 0 {
            ln = ln.replace("LOCAL ", "");
            self.rename_globals(&mut ln);
        } else {
            self.rename_locals(&mut ln);
        }

        ln = self.aliases.resolve_all(&ln, diagnostics)?;
        strings.restore(&mut ln);

        self.output.push_str(&ln);
        // Statements chain on one line; only a line that does not end
        // in a separator needs a break.
        if !ln.ends_with([';', ',', '[', ']', '{', '}']) {
            self.output.push('\n');
        }
        Ok(())
    }

    fn track_scope(&mut self, line: &str) {
        let openers =
            Regex::new(&format!(r"\b(?:{})\b", alternation(BLOCK_OPENERS))).expect("openers");
        for _ in openers.find_iter(line) {
            self.scope.enter_block();
        }
        let closers =
            Regex::new(&format!(r"\b(?:{})\b", alternation(BLOCK_CLOSERS))).expect("closers");
        for _ in closers.find_iter(line) {
            if self.scope.leave_block() == 0 {
                self.aliases.remove_all_out_of_scope();
                self.allocator.reset_locals();
            }
        }
    }

    fn register(&mut self, identifier: &str, real: String, kind: IdentityKind, scope: IdentityScope) {
        if identifier.len() < MIN_RENAME_LENGTH || self.aliases.identifier_exists(identifier) {
            return;
        }
        let mut silent = DiagnosticCollector::new();
        self.aliases.append(
            Identity::new(identifier, real, kind, scope),
            &self.scope,
            &mut silent,
        );
    }

    /// Top-level definitions: function names, their parameters and
    /// global variables.
    fn rename_globals(&mut self, line: &mut String) {
        let definition = Regex::new(r"^([A-Za-z]\w*)\(([\w,]*)\);?$").expect("definition");
        if let Some(captures) = definition.captures(line.as_str()) {
            let name = captures[1].to_string();
            let parameters = captures[2].to_string();
            let real = self.allocator.next_function(&self.aliases, &self.patterns);
            self.register(&name, real, IdentityKind::Alias, IdentityScope::Global);

            for parameter in parameters.split(',').map(str::trim) {
                if parameter.is_empty() {
                    continue;
                }
                let real = self.allocator.next_parameter(&self.aliases, &self.patterns);
                self.register(parameter, real, IdentityKind::Argument, IdentityScope::Local);
            }
        }

        let assignment = Regex::new(r"^([A-Za-z]\w*):=.*;").expect("global assignment");
        if let Some(captures) = assignment.captures(line.as_str()) {
            let name = captures[1].to_string();
            let real = self.allocator.next_global(&self.aliases, &self.patterns);
            self.register(&name, real, IdentityKind::Variable, IdentityScope::Global);
        }
    }

    /// Block-local declarations.
    fn rename_locals(&mut self, line: &mut String) {
        let declaration = Regex::new(r"\bLOCAL ([\w,]+);").expect("local declaration");
        if let Some(captures) = declaration.captures(line.as_str()) {
            let names = captures[1].to_string();
            for name in names.split(',').map(str::trim) {
                if name.is_empty() {
                    continue;
                }
                let real = self.allocator.next_variable(&self.aliases, &self.patterns);
                self.register(name, real, IdentityKind::Variable, IdentityScope::Local);
            }
        }

        let initialised = Regex::new(r"\bLOCAL ([A-Za-z]\w*):=").expect("local initialiser");
        if let Some(captures) = initialised.captures(line.as_str()) {
            let name = captures[1].to_string();
            let real = self.allocator.next_variable(&self.aliases, &self.patterns);
            self.register(&name, real, IdentityKind::Variable, IdentityScope::Local);
        }

        *line = line.replace("()", "");

        // Plain assignments store shorter as `expr▶name;`.
        let assignment = Regex::new(r"^([A-Za-z]\w*):=([^;]*);").expect("assignment");
        if let Some(captures) = assignment.captures(line.as_str()) {
            let rewritten = format!("{}▶{};", &captures[2], &captures[1]);
            let span = captures.get(0).map(|m| (m.start(), m.end()));
            if let Some((start, end)) = span {
                line.replace_range(start..end, &rewritten);
            }
        }
    }
}
