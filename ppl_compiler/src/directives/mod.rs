//! `#` directives: macro definition, conditional translation, include
//! detection and the `#pragma mode` switches.
//!
//! Directive lines are consumed here and never reach the rest of the
//! translator. Includes and pass-through blocks are only *recognised*
//! here; the pipeline drives the actual file recursion.

use std::path::PathBuf;

use regex::Regex;

use crate::aliases::{AliasTable, Identity, IdentityKind, IdentityScope};
use crate::config::runtime::{AssignmentStyle, Preferences};
use crate::diagnostics::DiagnosticCollector;
use crate::session::ScopeTracker;

#[derive(Debug, Clone, Default)]
struct ConditionalFrame {
    active: bool,
    any_true: bool,
    in_else: bool,
}

/// Stack of nested `#ifdef`/`#ifndef` frames. A line is translated only
/// while every enclosing frame is active.
#[derive(Debug, Default)]
struct ConditionalState {
    stack: Vec<ConditionalFrame>,
}

impl ConditionalState {
    fn is_active(&self) -> bool {
        self.stack.iter().all(|frame| frame.active)
    }

    fn push(&mut self, condition: bool) {
        let parent_active = self.is_active();
        self.stack.push(ConditionalFrame {
            active: parent_active && condition,
            any_true: condition,
            in_else: false,
        });
    }

    fn flip_else(&mut self) -> bool {
        let parent_active = self
            .stack
            .iter()
            .take(self.stack.len().saturating_sub(1))
            .all(|frame| frame.active);
        let Some(frame) = self.stack.last_mut() else {
            return false;
        };
        if frame.in_else {
            return false;
        }
        frame.active = parent_active && !frame.any_true;
        frame.any_true = true;
        frame.in_else = true;
        true
    }

    fn pop(&mut self) -> bool {
        self.stack.pop().is_some()
    }
}

/// Directive processor for one translation session.
#[derive(Debug, Default)]
pub struct Preprocessor {
    conditionals: ConditionalState,
    /// Search roots for `#include <…>`, first match wins.
    pub include_paths: Vec<PathBuf>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an inactive conditional branch is being skipped.
    pub fn disregard(&self) -> bool {
        !self.conditionals.is_active()
    }

    /// Process a directive line. Returns true when the line was
    /// consumed — either as a directive or as a skipped line inside an
    /// inactive branch — and must not be translated further.
    pub fn parse(
        &mut self,
        line: &str,
        aliases: &mut AliasTable,
        scope: &ScopeTracker,
        diagnostics: &mut DiagnosticCollector,
    ) -> bool {
        let trimmed = line.trim();

        // Conditionals are tracked even while skipping, so nested
        // inactive blocks close in the right order.
        let conditional =
            Regex::new(r"^#\s*(ifdef|ifndef|else|endif)\b\s*([A-Za-z_]\w*)?").expect("conditional");
        if let Some(captures) = conditional.captures(trimmed) {
            match &captures[1] {
                "ifdef" => {
                    let name = captures.get(2).map_or("", |m| m.as_str());
                    self.conditionals.push(aliases.identifier_exists(name));
                }
                "ifndef" => {
                    let name = captures.get(2).map_or("", |m| m.as_str());
                    self.conditionals.push(!aliases.identifier_exists(name));
                }
                "else" => {
                    if !self.conditionals.flip_else() {
                        diagnostics.warning(
                            "#else without matching #ifdef",
                            scope.current_path(),
                            scope.current_line(),
                        );
                    }
                }
                "endif" => {
                    if !self.conditionals.pop() {
                        diagnostics.warning(
                            "#endif without matching #ifdef",
                            scope.current_path(),
                            scope.current_line(),
                        );
                    }
                }
                _ => {}
            }
            return true;
        }

        if self.disregard() {
            return true;
        }

        let define =
            Regex::new(r"^#define +([A-Za-z_][\w:]*)(?:\(([^()]*)\))? *(.*)$").expect("define");
        if let Some(captures) = define.captures(trimmed) {
            let identifier = captures[1].to_string();
            let replacement = captures[3].trim().to_string();
            let identity = match captures.get(2) {
                Some(parameters) => {
                    let names: Vec<String> = parameters
                        .as_str()
                        .split(',')
                        .map(|name| name.trim().to_string())
                        .filter(|name| !name.is_empty())
                        .collect();
                    Identity::new(
                        identifier,
                        replacement,
                        IdentityKind::MacroFn,
                        IdentityScope::Auto,
                    )
                    .with_parameters(names)
                }
                None => Identity::new(
                    identifier,
                    replacement,
                    IdentityKind::Alias,
                    IdentityScope::Auto,
                ),
            };
            aliases.append(identity, scope, diagnostics);
            return true;
        }

        let undef = Regex::new(r"^#undef +([A-Za-z_][\w:]*)").expect("undef");
        if let Some(captures) = undef.captures(trimmed) {
            aliases.remove(&captures[1]);
            return true;
        }

        if trimmed.starts_with('#') {
            log::debug!(target: "ppl_compiler::directives", "consumed directive '{trimmed}'");
            return true;
        }

        false
    }
}

/// True for a quoted `#include "file"` line.
pub fn is_quoted_include(line: &str) -> bool {
    Regex::new(r#"^\s*#include\s+"[^"]+""#)
        .expect("quoted include")
        .is_match(line)
}

/// True for an angle `#include <name>` line.
pub fn is_angle_include(line: &str) -> bool {
    Regex::new(r"^\s*#include\s+<[^>]+>")
        .expect("angle include")
        .is_match(line)
}

/// The filename of either include form.
pub fn extract_include_filename(line: &str) -> Option<String> {
    Regex::new(r#"^\s*#include\s+(?:"([^"]+)"|<([^>]+)>)"#)
        .expect("include filename")
        .captures(line)
        .and_then(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map(|m| m.as_str().to_string())
}

/// True for an `#EXIT` line, which stops the current file.
pub fn is_exit(line: &str) -> bool {
    Regex::new(r"(?i)^\s*#EXIT\s*$").expect("exit").is_match(line)
}

/// True for the opening fence of a `#PYTHON` pass-through block.
pub fn is_python_block(line: &str) -> bool {
    Regex::new(r"^\s*#\s*PYTHON( .*)?$")
        .expect("python fence")
        .is_match(line)
}

/// True for the opening fence of a `#PPL` pass-through block.
pub fn is_ppl_block(line: &str) -> bool {
    Regex::new(r"^\s*#\s*PPL\s*(//.*)?$")
        .expect("ppl fence")
        .is_match(line)
}

/// True for the `#END` fence closing either pass-through block.
pub fn is_block_end(line: &str) -> bool {
    Regex::new(r"^\s*#\s*END\s*(?://.*)?$")
        .expect("end fence")
        .is_match(line)
}

/// Handle a `#pragma mode( … )` line: `assignment` and `indentation`
/// update the session preferences; every other setting is passed
/// through on a canonical pragma line for the calculator to interpret.
pub fn parse_pragma_mode(
    line: &str,
    prefs: &mut Preferences,
    scope: &ScopeTracker,
    diagnostics: &mut DiagnosticCollector,
) -> Option<String> {
    let shape = Regex::new(r"^\s*#pragma mode\s*\(.*\)\s*$").expect("pragma shape");
    if !shape.is_match(line) {
        return None;
    }

    let setting = Regex::new(r"([A-Za-z]\w*)\(([^()]*)\)").expect("pragma setting");
    let mut canonical = String::from("#pragma mode( ");
    for captures in setting.captures_iter(line) {
        let name = &captures[1];
        let value = &captures[2];
        match name {
            "assignment" => match value {
                ":=" => prefs.assignment = AssignmentStyle::Colon,
                "=" => prefs.assignment = AssignmentStyle::Equals,
                _ => diagnostics.warning(
                    format!("#pragma mode: '{}' invalid", &captures[0]),
                    scope.current_path(),
                    scope.current_line(),
                ),
            },
            "indentation" => {
                if let Ok(width) = value.trim().parse() {
                    prefs.indent_width = width;
                }
            }
            _ => {
                canonical.push_str(&captures[0]);
                canonical.push(' ');
            }
        }
    }
    canonical.push(')');
    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (AliasTable, ScopeTracker, DiagnosticCollector) {
        (
            AliasTable::new(),
            ScopeTracker::new(),
            DiagnosticCollector::new(),
        )
    }

    #[test]
    fn define_and_undef_round_trip() {
        let (mut aliases, scope, mut diagnostics) = fixture();
        let mut preprocessor = Preprocessor::new();

        assert!(preprocessor.parse("#define WIDTH 320", &mut aliases, &scope, &mut diagnostics));
        assert!(aliases.identifier_exists("WIDTH"));
        assert_eq!(aliases.get("WIDTH").unwrap().real, "320");

        assert!(preprocessor.parse("#undef WIDTH", &mut aliases, &scope, &mut diagnostics));
        assert!(!aliases.identifier_exists("WIDTH"));
    }

    #[test]
    fn function_like_define_keeps_parameters() {
        let (mut aliases, scope, mut diagnostics) = fixture();
        let mut preprocessor = Preprocessor::new();

        preprocessor.parse("#define SQ(x) x*x", &mut aliases, &scope, &mut diagnostics);
        let identity = aliases.get("SQ").unwrap();
        assert_eq!(identity.kind, IdentityKind::MacroFn);
        assert_eq!(identity.parameters, vec!["x".to_string()]);
    }

    #[test]
    fn inactive_branch_consumes_lines() {
        let (mut aliases, scope, mut diagnostics) = fixture();
        let mut preprocessor = Preprocessor::new();

        preprocessor.parse("#ifdef MISSING", &mut aliases, &scope, &mut diagnostics);
        assert!(preprocessor.disregard());
        assert!(preprocessor.parse("A:=1;", &mut aliases, &scope, &mut diagnostics));

        preprocessor.parse("#else", &mut aliases, &scope, &mut diagnostics);
        assert!(!preprocessor.disregard());
        assert!(!preprocessor.parse("A:=1;", &mut aliases, &scope, &mut diagnostics));

        preprocessor.parse("#endif", &mut aliases, &scope, &mut diagnostics);
        assert!(!preprocessor.disregard());
    }

    #[test]
    fn nested_conditionals_track_parent_state() {
        let (mut aliases, scope, mut diagnostics) = fixture();
        let mut preprocessor = Preprocessor::new();

        preprocessor.parse("#define SET", &mut aliases, &scope, &mut diagnostics);
        preprocessor.parse("#ifdef MISSING", &mut aliases, &scope, &mut diagnostics);
        preprocessor.parse("#ifdef SET", &mut aliases, &scope, &mut diagnostics);
        // Inner condition holds but the parent branch is inactive.
        assert!(preprocessor.disregard());
        preprocessor.parse("#endif", &mut aliases, &scope, &mut diagnostics);
        preprocessor.parse("#endif", &mut aliases, &scope, &mut diagnostics);
        assert!(!preprocessor.disregard());
    }

    #[test]
    fn unmatched_endif_is_reported() {
        let (mut aliases, scope, mut diagnostics) = fixture();
        let mut preprocessor = Preprocessor::new();
        preprocessor.parse("#endif", &mut aliases, &scope, &mut diagnostics);
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn include_recognition_and_extraction() {
        assert!(is_quoted_include("#include \"util.ppl+\""));
        assert!(!is_quoted_include("#include <util>"));
        assert!(is_angle_include("#include <util>"));
        assert_eq!(
            extract_include_filename("#include \"util.ppl+\"").as_deref(),
            Some("util.ppl+")
        );
        assert_eq!(extract_include_filename("#include <util>").as_deref(), Some("util"));
    }

    #[test]
    fn pragma_mode_updates_preferences() {
        let (_, scope, mut diagnostics) = fixture();
        let mut prefs = Preferences::default();

        let canonical = parse_pragma_mode(
            "#pragma mode( assignment(:=) indentation(4) separator(,) )",
            &mut prefs,
            &scope,
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(prefs.assignment, AssignmentStyle::Colon);
        assert_eq!(prefs.indent_width, 4);
        assert_eq!(canonical, "#pragma mode( separator(,) )");
    }

    #[test]
    fn block_fences_are_recognised() {
        assert!(is_python_block("#PYTHON"));
        assert!(is_python_block(" # PYTHON export"));
        assert!(is_ppl_block("#PPL // raw"));
        assert!(is_block_end("# END"));
        assert!(is_exit("  #exit "));
    }
}
