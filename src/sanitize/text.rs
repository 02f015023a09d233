//! Text cleaning.
//!
//! Cleaning drops characters that have no business in rendered text and
//! normalizes whitespace inside each line. Line structure is never changed:
//! the output has exactly as many `\n` as the input.

use bstr::ByteSlice;

/// Result of [`clean_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedText {
    pub text: String,
    /// Number of disallowed characters dropped (carriage returns excluded).
    pub removed: usize,
}

/// Clean `input`, reporting how many disallowed characters were dropped.
///
/// - `\r` is removed first (line-ending normalization, not counted);
/// - control characters other than `\n` and `\t` are removed;
/// - noncharacters and U+FFFD are removed;
/// - each line is split into words and rejoined with single spaces.
///
/// Lines are trimmed, so `"  a  \n b "` becomes `"a\nb"`.
pub fn clean_text(input: &str) -> CleanedText {
    let mut kept = String::with_capacity(input.len());
    let mut removed = 0;

    for c in input.chars() {
        match c {
            '\r' => {}
            '\n' => kept.push('\n'),
            c if is_disallowed(c) => removed += 1,
            c => kept.push(c),
        }
    }

    let text = kept
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    CleanedText { text, removed }
}

/// Clean text, discarding the removal count.
///
/// Idempotent: `sanitize_text(&sanitize_text(x)) == sanitize_text(x)`.
///
/// # Examples
///
/// ```
/// use folio::sanitize::sanitize_text;
///
/// assert_eq!(sanitize_text("Text\u{0}with\u{1}control\u{2}chars"), "Textwithcontrolchars");
/// assert_eq!(sanitize_text("a  \t b\r\nc"), "a b\nc");
/// ```
pub fn sanitize_text(input: &str) -> String {
    clean_text(input).text
}

/// Decode arbitrary bytes and clean the result.
///
/// Invalid UTF-8 sequences are dropped, so the output is always valid text.
pub fn sanitize_bytes(input: &[u8]) -> String {
    // Invalid sequences decode to U+FFFD, which cleaning removes
    sanitize_text(&input.to_str_lossy())
}

fn is_disallowed(c: char) -> bool {
    (c.is_control() && c != '\n' && c != '\t') || c == '\u{FFFD}' || is_noncharacter(c)
}

fn is_noncharacter(c: char) -> bool {
    let cp = c as u32;
    (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE
}
