//! Plain-text helpers shared by the translator, minifier and reformatter.

mod comments;
mod strings;

pub use comments::ProtectedComment;
pub use strings::ProtectedStrings;

use regex::Regex;

/// Collapse every whitespace run to a single space.
pub fn normalize_whitespace(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_whitespace = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                output.push(' ');
                in_whitespace = true;
            }
        } else {
            output.push(ch);
            in_whitespace = false;
        }
    }
    output
}

/// Drop all whitespace except the single space needed to keep two word
/// characters apart. Used by the minifier.
pub fn clean_whitespace(input: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut output = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            if is_word(ch) && output.chars().last().is_some_and(is_word) {
                output.push(' ');
            }
            pending_space = false;
        }
        output.push(ch);
    }
    output
}

/// Remove whitespace around structural operators and punctuation.
pub fn remove_whitespace_around_operators(input: &str) -> String {
    let re = Regex::new(r"\s*([{}\[\]()≤≥≠<>=*/+\-▶.,;:!^&|%`])\s*")
        .expect("operator spacing pattern");
    re.replace_all(input, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_runs_to_single_space() {
        assert_eq!(normalize_whitespace("a \t b\t\tc"), "a b c");
    }

    #[test]
    fn clean_whitespace_keeps_word_separation() {
        assert_eq!(clean_whitespace("LOCAL  a , b ;"), "LOCAL a,b;");
    }

    #[test]
    fn strips_spaces_around_operators() {
        assert_eq!(remove_whitespace_around_operators("a := b + 1 ;"), "a:=b+1;");
    }
}
