//! Per-line translation from the extended dialect to the target.

mod autoname;
pub mod keywords;
pub mod reformat;

pub use reformat::reformat_line;

use regex::Regex;

use crate::aliases::{Identity, IdentityKind, IdentityScope};
use crate::calc;
use crate::config::runtime::AssignmentStyle;
use crate::error::StructuralError;
use crate::session::TranslationSession;
use crate::text::{self, ProtectedComment, ProtectedStrings};
use crate::translator::keywords::{alternation, BLOCK_CLOSERS, BLOCK_OPENERS};

/// Split compound statements onto their own lines before per-line
/// translation, so `IF c THEN body END;` indents correctly. Pattern
/// definition lines are left alone; their text is not statement
/// structure.
pub fn split_structural(line: &str) -> String {
    let definition = Regex::new(r"^\s*(@[a-z]+ )?\s*regex ").expect("definition detect");
    if definition.is_match(line) {
        return line.to_string();
    }

    let mut result = line.to_string();
    result = Regex::new(r"(?i)\b(THEN)\b")
        .expect("then break")
        .replace_all(&result, "$1\n")
        .into_owned();
    result = Regex::new(r"(?i); *\b(ELSE)\b")
        .expect("else break")
        .replace_all(&result, ";\n$1\n")
        .into_owned();
    result = Regex::new(r"(?i); *(END|UNTIL|ELSE|LOCAL|CONST)?;")
        .expect("closer break")
        .replace_all(&result, ";\n$1;")
        .into_owned();
    result = Regex::new(r"(?i)(.+)\bBEGIN\b")
        .expect("begin break")
        .replace_all(&result, "$1\nBEGIN")
        .into_owned();
    result
}

/// Translate one logical line. The returned text already carries its
/// trailing newline; a consumed line (directive, definition, blank)
/// returns the empty string.
pub fn translate_line(
    input: &str,
    session: &mut TranslationSession,
) -> Result<String, StructuralError> {
    let mut line = input.trim().to_string();
    if line.is_empty() {
        return Ok(String::new());
    }

    if session
        .patterns
        .parse(&line, &session.scope, &mut session.diagnostics)
    {
        return Ok(String::new());
    }

    // A comment-only line is indented and passed through untouched.
    if line.starts_with("//") {
        let indent = " ".repeat(session.scope.depth() * session.prefs.indent_width);
        return Ok(format!("{indent}{line}\n"));
    }

    let mut strings = ProtectedStrings::new();
    strings.preserve(&line)?;
    strings.blank_out(&mut line)?;

    line = text::normalize_whitespace(&line);
    line = line.trim().to_string();

    let mut comment = ProtectedComment::new();
    comment.preserve(&line);
    comment.remove(&mut line);

    line = session
        .patterns
        .resolve_all(&line, session.scope.depth(), &mut session.diagnostics)?;

    if session.directives.parse(
        &line,
        &mut session.aliases,
        &session.scope,
        &mut session.diagnostics,
    ) {
        return Ok(String::new());
    }

    line = session.aliases.resolve_all(&line, &mut session.diagnostics)?;
    if line.is_empty() {
        return Ok(String::new());
    }

    line = autoname::apply(&line, session);

    line = reformat::capitalize_keywords(&line);
    line = text::remove_whitespace_around_operators(&line);
    line = reformat::canonicalize_digraphs(&line);
    if session.prefs.assignment == AssignmentStyle::Equals {
        line = reformat::convert_assignments(&line);
    }

    if parse_alias_definition(&line, session) {
        return Ok(String::new());
    }

    update_scope(&line, session);

    if session.scope.depth() == 0 {
        line = expand_key_definition(&line);
    }

    calc::parse(&mut line, &mut session.diagnostics);

    line = reformat::reformat_line(&line, session.scope.depth(), session.prefs.indent_width)?;

    // Escape markers a macro author may embed in replacement text.
    line = line.replace("__NL__", "\n");
    line = line.replace("__CR__", "\r");
    line = line.replace("__INDENT__", &" ".repeat(session.prefs.indent_width));
    line = line.replace("__SPACE__", " ");

    strings.restore(&mut line);
    comment.restore(&mut line);

    line.push('\n');
    Ok(line)
}

/// Recognize and consume `alias NAME:=REAL;`.
fn parse_alias_definition(line: &str, session: &mut TranslationSession) -> bool {
    let re = Regex::new(
        r"^alias ([A-Za-z_]\w*(?:::[A-Za-z_]\w*)*):=([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*);$",
    )
    .expect("alias definition");
    let Some(captures) = re.captures(line) else {
        return false;
    };
    session.aliases.append(
        Identity::new(
            captures[1].to_string(),
            captures[2].to_string(),
            IdentityKind::Alias,
            IdentityScope::Auto,
        ),
        &session.scope,
        &mut session.diagnostics,
    );
    true
}

/// Track block keywords and evict out-of-scope bindings exactly when
/// the depth returns to zero.
fn update_scope(line: &str, session: &mut TranslationSession) {
    let openers =
        Regex::new(&format!(r"\b(?:{})\b", alternation(BLOCK_OPENERS))).expect("block openers");
    for _ in openers.find_iter(line) {
        session.scope.enter_block();
    }

    let closers =
        Regex::new(&format!(r"\b(?:{})\b", alternation(BLOCK_CLOSERS))).expect("block closers");
    for _ in closers.find_iter(line) {
        if session.scope.leave_block() == 0 {
            session.aliases.remove_all_out_of_scope();
        }
        session
            .patterns
            .remove_all_out_of_scope(session.scope.depth());
    }
}

/// A bare key name at the top level becomes a key-handler definition.
fn expand_key_definition(line: &str) -> String {
    let re = Regex::new(r"^ *(KS?A?_[A-Z\d][a-z]*) *$").expect("key name");
    match re.captures(line) {
        Some(captures) => format!("KEY {}()", &captures[1]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preferences;
    use std::path::Path;

    fn session() -> TranslationSession {
        let mut session = TranslationSession::new(Preferences::default());
        session.scope.push_file(Path::new("main.ppl+"));
        session
    }

    fn translate(session: &mut TranslationSession, line: &str) -> String {
        translate_line(line, session).unwrap()
    }

    #[test]
    fn blank_lines_are_consumed() {
        let mut session = session();
        assert_eq!(translate(&mut session, "   "), "");
    }

    #[test]
    fn alias_definition_defines_and_consumes() {
        let mut session = session();
        assert_eq!(translate(&mut session, "alias speed:=S;"), "");
        assert_eq!(session.aliases.get("speed").unwrap().real, "S");
        let out = translate(&mut session, "speed:=10;");
        assert_eq!(out, "S := 10;\n");
    }

    #[test]
    fn equals_becomes_assignment_by_default() {
        let mut session = session();
        assert_eq!(translate(&mut session, "A=1;"), "A := 1;\n");
    }

    #[test]
    fn digraphs_are_canonicalized() {
        let mut session = session();
        let out = translate(&mut session, "X:=Y>=2;");
        assert_eq!(out, "X := Y ≥ 2;\n");
    }

    #[test]
    fn scope_tracks_and_indents() {
        let mut session = session();
        assert_eq!(translate(&mut session, "BEGIN"), "BEGIN\n");
        assert_eq!(session.scope.depth(), 1);
        assert_eq!(translate(&mut session, "A:=1;"), "  A := 1;\n");
        let out = translate(&mut session, "END;");
        assert_eq!(session.scope.depth(), 0);
        assert_eq!(out, "END;\n\n");
    }

    #[test]
    fn local_alias_dies_with_its_block() {
        let mut session = session();
        translate(&mut session, "BEGIN");
        translate(&mut session, "alias tmp:=T;");
        assert!(session.aliases.identifier_exists("tmp"));
        translate(&mut session, "END;");
        assert!(!session.aliases.identifier_exists("tmp"));
    }

    #[test]
    fn global_pattern_survives_block_close() {
        let mut session = session();
        translate(&mut session, "BEGIN");
        translate(&mut session, "regex @`paint` DRAW");
        translate(&mut session, "regex `wipe` CLEAR");
        translate(&mut session, "END;");
        assert!(session.patterns.pattern_exists("paint"));
        assert!(!session.patterns.pattern_exists("wipe"));
    }

    #[test]
    fn directives_consume_their_lines() {
        let mut session = session();
        assert_eq!(translate(&mut session, "#define WIDTH 320"), "");
        assert_eq!(translate(&mut session, "X:=WIDTH;"), "X := 320;\n");
    }

    #[test]
    fn macro_function_resolves_inline() {
        let mut session = session();
        translate(&mut session, "#define SQ(x) x*x");
        let out = translate(&mut session, "A:=SQ(4);");
        assert_eq!(out, "A := 4 * 4;\n");
    }

    #[test]
    fn comment_only_lines_pass_through() {
        let mut session = session();
        assert_eq!(translate(&mut session, "// note"), "// note\n");
    }

    #[test]
    fn trailing_comment_is_restored() {
        let mut session = session();
        let out = translate(&mut session, "A:=1; // set");
        assert_eq!(out, "A := 1; // set\n");
    }

    #[test]
    fn key_name_becomes_key_definition() {
        let mut session = session();
        let out = translate(&mut session, "K_Esc");
        assert!(out.starts_with("KEY K_Esc()"));
    }

    #[test]
    fn structural_split_separates_then() {
        let split = split_structural("IF A THEN B:=1; END;");
        let parts: Vec<&str> = split.split('\n').collect();
        assert!(parts[0].trim_end().ends_with("THEN"));
        assert!(parts.len() >= 3);
    }

    #[test]
    fn second_translation_is_idempotent() {
        let mut first = session();
        let canonical = translate(&mut first, "x:=y+1;");

        let mut second = session();
        let again = translate(&mut second, canonical.trim_end_matches('\n'));
        assert_eq!(again, canonical);
    }

    #[test]
    fn embedded_expression_evaluates() {
        let mut session = session();
        let out = translate(&mut session, r"A:=\[3*7];");
        assert_eq!(out, "A := 21;\n");
    }
}
