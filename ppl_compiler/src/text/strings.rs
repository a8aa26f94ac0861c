//! String-literal protection.
//!
//! Substitution passes must never rewrite the inside of a string
//! literal. Before a line is processed its literals are preserved in
//! order and their interiors blanked out with spaces, so patterns still
//! see a string of the right shape but cannot match its content. After
//! all passes the originals are restored verbatim, in order.

use crate::error::{context_snippet, StructuralError};

#[derive(Debug, Default)]
pub struct ProtectedStrings {
    literals: Vec<String>,
}

impl ProtectedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every `"…"` literal in `text`, in order of appearance.
    ///
    /// An unterminated literal defeats the translator's structural
    /// assumptions and is fatal.
    pub fn preserve(&mut self, text: &str) -> Result<(), StructuralError> {
        for span in literal_spans(text)? {
            self.literals.push(text[span.0..span.1].to_string());
        }
        Ok(())
    }

    /// Replace the interior of every literal with spaces, keeping the
    /// enclosing quotes so the line keeps its shape.
    pub fn blank_out(&self, text: &mut String) -> Result<(), StructuralError> {
        let spans = literal_spans(text)?;
        if spans.is_empty() {
            return Ok(());
        }
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end) in spans {
            output.push_str(&text[cursor..start]);
            output.push('"');
            let interior = &text[start + 1..end - 1];
            output.extend(interior.chars().map(|_| ' '));
            output.push('"');
            cursor = end;
        }
        output.push_str(&text[cursor..]);
        *text = output;
        Ok(())
    }

    /// Put the preserved literals back, in original order.
    ///
    /// Any blanked literal beyond the preserved count is left as-is;
    /// the translator never introduces new quotes, so counts match in
    /// practice.
    pub fn restore(&self, text: &mut String) {
        let Ok(spans) = literal_spans(text) else {
            return;
        };
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for (index, (start, end)) in spans.into_iter().enumerate() {
            let Some(original) = self.literals.get(index) else {
                break;
            };
            output.push_str(&text[cursor..start]);
            output.push_str(original);
            cursor = end;
        }
        output.push_str(&text[cursor..]);
        *text = output;
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// Byte spans of every string literal, quotes included.
fn literal_spans(text: &str) -> Result<Vec<(usize, usize)>, StructuralError> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    for (index, ch) in text.char_indices() {
        if ch != '"' {
            continue;
        }
        match open.take() {
            None => open = Some(index),
            Some(start) => spans.push((start, index + 1)),
        }
    }
    if open.is_some() {
        return Err(StructuralError::UnterminatedString {
            context: context_snippet(text),
        });
    }
    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn blanks_and_restores_in_order() {
        let mut line = r#"PRINT("IF x THEN");A:="END";"#.to_string();
        let mut strings = ProtectedStrings::new();
        strings.preserve(&line).unwrap();
        strings.blank_out(&mut line).unwrap();
        assert!(!line.contains("IF x THEN"));
        assert_eq!(line.matches('"').count(), 4);
        strings.restore(&mut line);
        assert_eq!(line, r#"PRINT("IF x THEN");A:="END";"#);
    }

    #[test]
    fn unterminated_literal_is_fatal() {
        let mut strings = ProtectedStrings::new();
        let result = strings.preserve(r#"A:="oops;"#);
        assert_matches!(result, Err(StructuralError::UnterminatedString { .. }));
    }

    #[test]
    fn line_without_literals_is_untouched() {
        let mut line = "A:=1;".to_string();
        let mut strings = ProtectedStrings::new();
        strings.preserve(&line).unwrap();
        strings.blank_out(&mut line).unwrap();
        strings.restore(&mut line);
        assert_eq!(line, "A:=1;");
    }
}
