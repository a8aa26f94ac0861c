//! The alias table and its fixpoint substitution pass.

use regex::{NoExpand, Regex};

use crate::aliases::{Identity, IdentityKind, IdentityScope};
use crate::diagnostics::DiagnosticCollector;
use crate::error::{context_snippet, fixpoint_pass_limit, StructuralError};
use crate::session::ScopeTracker;
use crate::text::ProtectedStrings;

/// Scoped store of identifier bindings, kept sorted by descending
/// identifier length so longest-match-first resolution never backtracks
/// over a partial match.
#[derive(Debug, Default)]
pub struct AliasTable {
    identities: Vec<Identity>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binding. A live identifier is never overwritten: the
    /// duplicate is rejected with a warning citing the previous
    /// definition site.
    pub fn append(
        &mut self,
        mut identity: Identity,
        scope: &ScopeTracker,
        diagnostics: &mut DiagnosticCollector,
    ) -> bool {
        identity.identifier = identity.identifier.trim().to_string();
        identity.real = identity.real.trim().to_string();
        if identity.identifier.is_empty() {
            return false;
        }

        identity.path = scope.current_path().map(|p| p.to_path_buf());
        identity.line = scope.current_line();
        if identity.scope == IdentityScope::Auto {
            identity.scope = if scope.depth() == 0 {
                IdentityScope::Global
            } else {
                IdentityScope::Local
            };
        }

        if let Some(previous) = self.get(&identity.identifier) {
            let site = match &previous.path {
                Some(path) => format!("{}:{}", path.display(), previous.line),
                None => format!("line {}", previous.line),
            };
            diagnostics.warning(
                format!(
                    "redefinition of '{}', previous definition at {}",
                    identity.identifier, site
                ),
                scope.current_path(),
                scope.current_line(),
            );
            return false;
        }

        log::debug!(
            target: "ppl_compiler::aliases",
            "defined {}{} '{}' for '{}'",
            if identity.scope == IdentityScope::Local { "local " } else { "" },
            identity.kind.as_str(),
            identity.identifier,
            identity.real
        );

        self.identities.push(identity);
        self.identities
            .sort_by(|a, b| b.identifier.len().cmp(&a.identifier.len()));
        true
    }

    /// Rewrite every live binding in `text`, repeating until the text
    /// stops changing so alias-of-alias chains resolve. The pass count
    /// is bounded; a self-referential chain that never settles is
    /// reported instead of looping.
    pub fn resolve_all(
        &self,
        text: &str,
        diagnostics: &mut DiagnosticCollector,
    ) -> Result<String, StructuralError> {
        if text.is_empty() || self.identities.is_empty() {
            return Ok(text.to_string());
        }

        let limit = fixpoint_pass_limit(text.len());
        let mut current = text.to_string();
        for _ in 0..limit {
            let next = self.resolve_pass(&current, diagnostics)?;
            if next == current {
                return Ok(next);
            }
            current = next;
        }
        Err(StructuralError::FixpointOverflow {
            limit,
            context: context_snippet(text),
        })
    }

    fn resolve_pass(
        &self,
        text: &str,
        diagnostics: &mut DiagnosticCollector,
    ) -> Result<String, StructuralError> {
        let mut strings = ProtectedStrings::new();
        let mut line = text.to_string();
        strings.preserve(&line)?;
        strings.blank_out(&mut line)?;

        for identity in &self.identities {
            if !identity.parameters.is_empty() {
                line = resolve_macro_calls(&line, identity)?;
                continue;
            }

            if identity.is_delimited() {
                if line.contains(&identity.identifier) {
                    line = line.replace(&identity.identifier, &identity.real);
                }
                continue;
            }

            let pattern = format!(r"\b{}\b", regex::escape(&identity.identifier));
            let Ok(re) = Regex::new(&pattern) else {
                diagnostics.warning(
                    format!("unusable identifier '{}'", identity.identifier),
                    identity.path.as_deref(),
                    identity.line,
                );
                continue;
            };
            if re.is_match(&line) {
                line = re.replace_all(&line, NoExpand(&identity.real)).into_owned();
            }
        }

        strings.restore(&mut line);
        Ok(line)
    }

    /// Delete every Local binding; called when nesting returns to the
    /// global scope.
    pub fn remove_all_out_of_scope(&mut self) {
        self.identities.retain(|identity| {
            let keep = identity.scope != IdentityScope::Local;
            if !keep {
                log::debug!(
                    target: "ppl_compiler::aliases",
                    "removed local {} '{}'",
                    identity.kind.as_str(),
                    identity.identifier
                );
            }
            keep
        });
    }

    pub fn remove_all_of_kind(&mut self, kind: IdentityKind) {
        self.identities.retain(|identity| identity.kind != kind);
    }

    pub fn remove(&mut self, identifier: &str) {
        self.identities
            .retain(|identity| identity.identifier != identifier);
    }

    pub fn identifier_exists(&self, identifier: &str) -> bool {
        self.identities
            .iter()
            .any(|identity| identity.identifier == identifier)
    }

    pub fn real_exists(&self, real: &str) -> bool {
        self.identities.iter().any(|identity| identity.real == real)
    }

    pub fn get(&self, identifier: &str) -> Option<&Identity> {
        self.identities
            .iter()
            .find(|identity| identity.identifier == identifier)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Expand every call-shaped occurrence `name(arg1,…,argN)` of a macro
/// function. Replacements are spliced in one pass; cascaded expansions
/// are handled by the caller's fixpoint loop.
fn resolve_macro_calls(text: &str, identity: &Identity) -> Result<String, StructuralError> {
    let pattern = format!(r"\b{}\(([^()]*)\)", regex::escape(&identity.identifier));
    let Ok(re) = Regex::new(&pattern) else {
        return Ok(text.to_string());
    };

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for captures in re.captures_iter(text) {
        let Some(call) = captures.get(0) else {
            continue;
        };
        let arguments = split_arguments(captures.get(1).map_or("", |m| m.as_str()));
        if arguments.len() != identity.parameters.len() {
            return Err(StructuralError::MacroArity {
                name: identity.identifier.clone(),
                expected: identity.parameters.len(),
                found: arguments.len(),
            });
        }
        output.push_str(&text[cursor..call.start()]);
        output.push_str(&expand_macro_body(identity, &arguments));
        cursor = call.end();
    }
    output.push_str(&text[cursor..]);
    Ok(output)
}

/// Substitute a macro body: each formal parameter by name, then the
/// positional markers `$1`…`$N`, with `$0` standing for the call name.
fn expand_macro_body(identity: &Identity, arguments: &[String]) -> String {
    let mut body = identity.real.clone();

    for (index, parameter) in identity.parameters.iter().enumerate() {
        let value = arguments.get(index).map_or("", String::as_str);
        if let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(parameter))) {
            body = re.replace_all(&body, NoExpand(value)).into_owned();
        }
    }

    if let Ok(re) = Regex::new(r"\$(\d+)") {
        body = re
            .replace_all(&body, |captures: &regex::Captures| {
                let index: usize = captures[1].parse().unwrap_or(0);
                if index == 0 {
                    identity.identifier.clone()
                } else {
                    arguments.get(index - 1).cloned().unwrap_or_default()
                }
            })
            .into_owned();
    }

    body
}

/// Split an argument list on top-level commas; commas nested in
/// brackets or strings do not separate arguments.
fn split_arguments(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut arguments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    for ch in text.chars() {
        match ch {
            '"' => {
                in_string = !in_string;
                current.push(ch);
            }
            '(' | '[' | '{' if !in_string => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' if !in_string => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if !in_string && depth == 0 => {
                arguments.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    arguments.push(current.trim().to_string());
    arguments
}
