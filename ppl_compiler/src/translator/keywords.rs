//! Reserved words of the target language.

/// Keywords that open a block and deepen the nesting scope.
pub const BLOCK_OPENERS: &[&str] = &["BEGIN", "IF", "FOR", "CASE", "REPEAT", "WHILE", "IFERR"];

/// Keywords that close a block.
pub const BLOCK_CLOSERS: &[&str] = &["END", "UNTIL"];

/// All reserved keywords, spelled the way the target expects them.
pub const RESERVED: &[&str] = &[
    "BEGIN", "END", "RETURN", "KILL", "IF", "THEN", "ELSE", "XOR", "OR", "AND", "NOT", "CASE",
    "DEFAULT", "IFERR", "IFTE", "FOR", "FROM", "STEP", "DOWNTO", "TO", "DO", "WHILE", "REPEAT",
    "UNTIL", "BREAK", "CONTINUE", "EXPORT", "CONST", "LOCAL", "KEY",
];

/// Built-in function names that are capitalized like keywords.
pub const FUNCTIONS: &[&str] = &["LOG", "COS", "SIN", "TAN", "LN", "MIN", "MAX"];

/// Keywords that keep a line at the enclosing indentation level when
/// reformatting.
pub const OUTDENTED: &[&str] = &["BEGIN", "IF", "CASE", "REPEAT", "WHILE", "FOR", "ELSE", "IFERR"];

/// A `|`-joined alternation of a keyword list, for building patterns.
pub fn alternation(words: &[&str]) -> String {
    words.join("|")
}

/// The same alternation in lowercase, for the capitalization pass.
pub fn lowercase_alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("|")
}
