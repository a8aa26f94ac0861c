//! Synthetic short-name allocation.
//!
//! Identifiers that are illegal in the target syntax are replaced with
//! table-assigned short names: a per-kind prefix plus a monotonic
//! counter rendered in base 32. A candidate is only handed out after
//! checking the alias table and the pattern library for collisions.

use crate::aliases::AliasTable;
use crate::config::constants::BASE32_DIGITS;
use crate::patterns::PatternLibrary;

/// Render `value` with the base-32 digit set used for short names.
pub fn base32(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE32_DIGITS[(value % 32) as usize]);
        value /= 32;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Monotonic per-kind counters for synthetic names.
///
/// Function and global counters run for the whole session; parameter
/// and variable counters restart for each top-level definition.
#[derive(Debug, Default)]
pub struct NameAllocator {
    function: u32,
    global: u32,
    parameter: u32,
    variable: u32,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_function(&mut self, aliases: &AliasTable, patterns: &PatternLibrary) -> String {
        Self::next(&mut self.function, "fn", aliases, patterns)
    }

    pub fn next_global(&mut self, aliases: &AliasTable, patterns: &PatternLibrary) -> String {
        Self::next(&mut self.global, "g", aliases, patterns)
    }

    pub fn next_parameter(&mut self, aliases: &AliasTable, patterns: &PatternLibrary) -> String {
        Self::next(&mut self.parameter, "p", aliases, patterns)
    }

    pub fn next_variable(&mut self, aliases: &AliasTable, patterns: &PatternLibrary) -> String {
        Self::next(&mut self.variable, "v", aliases, patterns)
    }

    /// Restart the per-definition counters.
    pub fn reset_locals(&mut self) {
        self.parameter = 0;
        self.variable = 0;
    }

    fn next(
        counter: &mut u32,
        prefix: &str,
        aliases: &AliasTable,
        patterns: &PatternLibrary,
    ) -> String {
        loop {
            *counter += 1;
            let candidate = format!("{prefix}{}", base32(*counter));
            if !aliases.real_exists(&candidate)
                && !aliases.identifier_exists(&candidate)
                && !patterns.mentions(&candidate)
            {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::{Identity, IdentityKind, IdentityScope};
    use crate::diagnostics::DiagnosticCollector;
    use crate::session::ScopeTracker;

    #[test]
    fn base32_uses_mixed_digit_set() {
        assert_eq!(base32(0), "0");
        assert_eq!(base32(1), "1");
        assert_eq!(base32(10), "A");
        assert_eq!(base32(31), "h");
        assert_eq!(base32(32), "10");
    }

    #[test]
    fn allocation_skips_taken_names() {
        let mut aliases = AliasTable::new();
        let patterns = PatternLibrary::new();
        let mut diagnostics = DiagnosticCollector::new();
        let scope = ScopeTracker::new();
        aliases.append(
            Identity::new("width", "v1", IdentityKind::Variable, IdentityScope::Global),
            &scope,
            &mut diagnostics,
        );

        let mut allocator = NameAllocator::new();
        assert_eq!(allocator.next_variable(&aliases, &patterns), "v2");
    }

    #[test]
    fn local_counters_restart() {
        let aliases = AliasTable::new();
        let patterns = PatternLibrary::new();
        let mut allocator = NameAllocator::new();
        assert_eq!(allocator.next_parameter(&aliases, &patterns), "p1");
        assert_eq!(allocator.next_parameter(&aliases, &patterns), "p2");
        allocator.reset_locals();
        assert_eq!(allocator.next_parameter(&aliases, &patterns), "p1");
    }
}
