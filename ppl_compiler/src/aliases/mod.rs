//! Scoped identifier bindings and their substitution engine.

mod allocator;
mod table;

pub use allocator::{base32, NameAllocator};
pub use table::AliasTable;

use std::path::PathBuf;

/// What kind of binding an identity is. The kind drives resolution
/// behaviour (macro functions take arguments) and bulk removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Alias,
    MacroFn,
    Variable,
    Argument,
    Property,
    Unknown,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::Alias => "alias",
            IdentityKind::MacroFn => "macro function",
            IdentityKind::Variable => "variable alias",
            IdentityKind::Argument => "argument alias",
            IdentityKind::Property => "property alias",
            IdentityKind::Unknown => "alias",
        }
    }
}

/// Lifetime of a binding. `Auto` resolves at append time: Global when
/// defined at depth 0, Local inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityScope {
    Auto,
    Global,
    Local,
}

/// One identifier binding: `identifier` is rewritten to `real` wherever
/// it appears as a whole word. Macro functions additionally carry their
/// ordered parameter names.
#[derive(Debug, Clone)]
pub struct Identity {
    pub identifier: String,
    pub real: String,
    pub kind: IdentityKind,
    pub scope: IdentityScope,
    pub parameters: Vec<String>,
    pub path: Option<PathBuf>,
    pub line: u32,
}

impl Identity {
    pub fn new(
        identifier: impl Into<String>,
        real: impl Into<String>,
        kind: IdentityKind,
        scope: IdentityScope,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            real: real.into(),
            kind,
            scope,
            parameters: Vec::new(),
            path: None,
            line: 0,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Backtick-delimited identifiers are matched as literal substrings
    /// instead of whole words, so operators can be aliased too.
    pub fn is_delimited(&self) -> bool {
        self.identifier.len() >= 2
            && self.identifier.starts_with('`')
            && self.identifier.ends_with('`')
    }
}
