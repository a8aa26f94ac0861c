//! Fatal translation errors.
//!
//! Only defects that defeat the translator's structural assumptions
//! abort a run; everything else is a recoverable diagnostic collected by
//! the session. See `diagnostics` for the recoverable side.

/// Errors that abort translation immediately.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StructuralError {
    #[error("unterminated string literal in '{context}'")]
    UnterminatedString { context: String },

    #[error("substitution failed to settle within {limit} passes in '{context}'")]
    FixpointOverflow { limit: usize, context: String },

    #[error("macro '{name}' expects {expected} argument(s), found {found}")]
    MacroArity {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Upper bound on fixpoint substitution passes for an input of
/// `input_len` bytes. Alias and pattern resolution repeat until the text
/// stops changing; each productive pass rewrites at least one character,
/// so a bound proportional to the input length converts a runaway
/// self-referential definition into a reported error instead of an
/// endless loop.
pub fn fixpoint_pass_limit(input_len: usize) -> usize {
    crate::config::constants::FIXPOINT_BASE_PASSES + input_len
}

/// Trim long source text down to a readable diagnostic context.
pub fn context_snippet(text: &str) -> String {
    const MAX: usize = 64;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let snippet: String = text.chars().take(MAX).collect();
        format!("{snippet}…")
    }
}
