//! Inferred naming for identifiers the target syntax rejects.
//!
//! The extended dialect allows namespaced (`gfx::draw`), dotted and
//! underscore-prefixed names. None of those survive in the target, so
//! each one is bound to a table-assigned synthetic short name and every
//! later occurrence resolves through the alias table like any other
//! binding.

use regex::{NoExpand, Regex};

use crate::aliases::{Identity, IdentityKind, IdentityScope};
use crate::session::TranslationSession;

/// True when `name` is legal in the target syntax.
fn is_valid_target_name(name: &str) -> bool {
    let name = name.trim_start_matches('@');
    !name.is_empty() && !name.starts_with('_') && !name.contains("::") && !name.contains('.')
}

/// Split a declaration list on top-level commas; initialisers may nest
/// commas inside brackets or braces.
fn split_declarations(list: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in list.chars() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                items.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        items.push(current.trim().to_string());
    }
    items
}

/// The declared name of one declaration item, initialiser stripped.
fn declared_name(item: &str) -> &str {
    item.split(":=").next().unwrap_or(item).trim()
}

fn replace_word(line: &str, from: &str, to: &str) -> String {
    let pattern = format!(r"\b{}\b", regex::escape(from));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(line, NoExpand(to)).into_owned(),
        Err(_) => line.to_string(),
    }
}

/// Bind `name` to a fresh synthetic short name and rewrite the current
/// line. The binding lands in the alias table, so every later use of
/// the illegal name resolves to the same synthetic one.
fn assign(
    line: &str,
    name: &str,
    synthetic: String,
    kind: IdentityKind,
    scope: IdentityScope,
    session: &mut TranslationSession,
) -> String {
    let rewritten = replace_word(line, name, &synthetic);
    session.aliases.append(
        Identity::new(name, synthetic, kind, scope),
        &session.scope,
        &mut session.diagnostics,
    );
    rewritten
}

/// Apply inferred naming to one line.
pub fn apply(line: &str, session: &mut TranslationSession) -> String {
    let mut result = line.to_string();

    // Top-level function definitions: the name and its parameters.
    if session.scope.depth() == 0 {
        let definition = Regex::new(r"^(?i:EXPORT +)?([A-Za-z_@][\w:.]*)\(([^()]*)\)$")
            .expect("function definition");
        if let Some(captures) = definition.captures(&result) {
            session.autoname.reset_locals();
            let name = captures[1].to_string();
            let parameters = captures[2].to_string();

            if !is_valid_target_name(&name) {
                let synthetic = session
                    .autoname
                    .next_function(&session.aliases, &session.patterns);
                result = assign(
                    &result,
                    &name,
                    synthetic,
                    IdentityKind::Alias,
                    IdentityScope::Global,
                    session,
                );
            }

            for parameter in split_declarations(&parameters) {
                let name = declared_name(&parameter);
                if !is_valid_target_name(name) {
                    let synthetic = session
                        .autoname
                        .next_parameter(&session.aliases, &session.patterns);
                    result = assign(
                        &result,
                        name,
                        synthetic,
                        IdentityKind::Argument,
                        IdentityScope::Local,
                        session,
                    );
                }
            }
        }
    }

    // Variable and constant declarations at any depth.
    let declaration =
        Regex::new(r"(?i)\b(?:LOCAL|CONST)\b +([^;]+);").expect("declaration list");
    if let Some(captures) = declaration.captures(&result) {
        let list = captures[1].to_string();
        for item in split_declarations(&list) {
            let name = declared_name(&item);
            if !is_valid_target_name(name) {
                let synthetic = if session.scope.depth() == 0 {
                    session
                        .autoname
                        .next_global(&session.aliases, &session.patterns)
                } else {
                    session
                        .autoname
                        .next_variable(&session.aliases, &session.patterns)
                };
                result = assign(
                    &result,
                    name,
                    synthetic,
                    IdentityKind::Variable,
                    IdentityScope::Auto,
                    session,
                );
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preferences;

    fn session() -> TranslationSession {
        let mut session = TranslationSession::new(Preferences::default());
        session.scope.push_file(std::path::Path::new("main.ppl+"));
        session
    }

    #[test]
    fn namespaced_local_gets_synthetic_name() {
        let mut session = session();
        session.scope.enter_block();
        let line = apply("LOCAL gfx::x:=1;", &mut session);
        assert_eq!(line, "LOCAL v1:=1;");
        assert_eq!(session.aliases.get("gfx::x").unwrap().real, "v1");
    }

    #[test]
    fn later_uses_resolve_through_the_table() {
        let mut session = session();
        session.scope.enter_block();
        apply("LOCAL _tmp;", &mut session);
        let resolved = session
            .aliases
            .resolve_all("_tmp+1", &mut session.diagnostics)
            .unwrap();
        assert_eq!(resolved, "v1+1");
    }

    #[test]
    fn function_definition_renames_name_and_parameters() {
        let mut session = session();
        let line = apply("gfx::draw(_x,y)", &mut session);
        assert_eq!(line, "fn1(p1,y)");
        assert_eq!(session.aliases.get("gfx::draw").unwrap().real, "fn1");
        assert_eq!(session.aliases.get("_x").unwrap().real, "p1");
        assert!(session.aliases.get("y").is_none());
    }

    #[test]
    fn top_level_declarations_use_global_counter() {
        let mut session = session();
        let line = apply("LOCAL app::total;", &mut session);
        assert_eq!(line, "LOCAL g1;");
    }

    #[test]
    fn valid_names_are_left_alone() {
        let mut session = session();
        let line = apply("LOCAL speed,limit;", &mut session);
        assert_eq!(line, "LOCAL speed,limit;");
        assert!(session.aliases.is_empty());
    }
}
