//! The per-invocation translation session.

mod scope;

pub use scope::ScopeTracker;

use crate::aliases::{AliasTable, NameAllocator};
use crate::config::constants::{NUMERIC_BUILD, NUMERIC_VERSION};
use crate::config::Preferences;
use crate::diagnostics::DiagnosticCollector;
use crate::directives::Preprocessor;
use crate::patterns::PatternLibrary;

/// Everything one translation run owns: the alias table, the pattern
/// library, the scope tracker, the directive preprocessor, the
/// synthetic-name allocator and the diagnostic collector. Exactly one
/// session exists per invocation and is threaded through every call, so
/// independent sessions never share state.
#[derive(Debug, Default)]
pub struct TranslationSession {
    pub aliases: AliasTable,
    pub patterns: PatternLibrary,
    pub scope: ScopeTracker,
    pub directives: Preprocessor,
    pub autoname: NameAllocator,
    pub diagnostics: DiagnosticCollector,
    pub prefs: Preferences,
}

impl TranslationSession {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs,
            ..Self::default()
        }
    }

    /// Bind the macros every translation starts with.
    pub fn define_builtin_macros(&mut self) {
        for definition in [
            "#define __pplplus".to_string(),
            "#define __LIST_LIMIT 10000".to_string(),
            format!("#define __VERSION {NUMERIC_VERSION}"),
            format!("#define __NUMERIC_BUILD {NUMERIC_BUILD}"),
        ] {
            self.directives.parse(
                &definition,
                &mut self.aliases,
                &self.scope,
                &mut self.diagnostics,
            );
        }
    }
}
