//! Trailing-comment protection.
//!
//! A `//` comment at the end of a line is lifted out before the
//! substitution passes run and appended back once the line is fully
//! translated.

#[derive(Debug, Default)]
pub struct ProtectedComment {
    comment: Option<String>,
}

impl ProtectedComment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the trailing `//` comment of `text`, if any. Quoted `//`
    /// sequences do not start a comment.
    pub fn preserve(&mut self, text: &str) {
        if let Some(index) = comment_start(text) {
            self.comment = Some(text[index..].to_string());
        }
    }

    /// Truncate `text` at the start of its trailing comment.
    pub fn remove(&self, text: &mut String) {
        if let Some(index) = comment_start(text) {
            text.truncate(index);
            while text.ends_with(' ') {
                text.pop();
            }
        }
    }

    /// Append the preserved comment back onto `text`.
    pub fn restore(&self, text: &mut String) {
        if let Some(comment) = &self.comment {
            if !text.is_empty() && !text.ends_with(' ') {
                text.push(' ');
            }
            text.push_str(comment);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.comment.is_none()
    }
}

fn comment_start(text: &str) -> Option<usize> {
    let mut in_string = false;
    let mut previous = '\0';
    for (index, ch) in text.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '/' if !in_string && previous == '/' => return Some(index - 1),
            _ => {}
        }
        previous = ch;
    }
    None
}
