//! Runtime preferences for a translation session.

use crate::config::constants::DEFAULT_INDENT_WIDTH;

/// Which source spelling the input uses for assignment.
///
/// With `Equals` (the default), a bare `=` in the input is rewritten to
/// the target's `:=`; with `Colon` the input already writes `:=` and
/// bare `=` is left for the equality rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStyle {
    Equals,
    Colon,
}

/// Per-session tunables, adjustable mid-run by `#pragma mode( … )`.
#[derive(Debug, Clone)]
pub struct Preferences {
    /// Spaces per nesting level in reformatted output.
    pub indent_width: usize,
    /// Assignment spelling of the input dialect.
    pub assignment: AssignmentStyle,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            assignment: AssignmentStyle::Equals,
        }
    }
}
