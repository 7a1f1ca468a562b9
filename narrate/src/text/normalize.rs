//! Line-break normalization for text pasted from PDFs and e-books.

/// Join lines that were wrapped inside a paragraph.
///
/// This function:
/// - Replaces every single newline with a space
/// - Leaves runs of two or more newlines (paragraph breaks) untouched
///
/// Applying it twice gives the same result as applying it once.
pub fn fix_line_breaks(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut prev_was_newline = false;

    while let Some(c) = chars.next() {
        if c == '\n' {
            let next_is_newline = chars.peek() == Some(&'\n');
            if prev_was_newline || next_is_newline {
                result.push('\n');
            } else {
                result.push(' ');
            }
            prev_was_newline = true;
        } else {
            result.push(c);
            prev_was_newline = false;
        }
    }

    result
}
