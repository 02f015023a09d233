//! Escaping and anchor helpers shared by the text writers.

use std::borrow::Cow;
use std::collections::HashSet;

/// Escape special Markdown characters in text.
///
/// Escapes characters that have special meaning in Markdown:
/// - Backslash: `\\`
/// - Emphasis and strikethrough: `*`, `_`, `~`
/// - Links: `[`, `]`
/// - Code: `` ` ``
/// - Headings: `#` (only at line start)
/// - Tables: `|`
/// - HTML: `<`, `>`
/// - Images: `!` (when followed by `[`)
/// - Math: `$`
///
/// # Examples
///
/// ```
/// use folio::writer::escape_markdown;
///
/// assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
/// assert_eq!(escape_markdown("[link]"), "\\[link\\]");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    let mut chars = text.chars().peekable();
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        let escape = match c {
            '\\' | '*' | '_' | '~' | '[' | ']' | '`' | '|' | '<' | '>' | '$' => true,
            '#' => at_line_start,
            '!' => chars.peek() == Some(&'['),
            _ => false,
        };
        if escape {
            result.push('\\');
        }
        result.push(c);
        at_line_start = c == '\n';
    }

    result
}

/// Escape XML special characters (`&`, `<`, `>`, `"`, `'`).
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Escape LaTeX special characters.
///
/// # Examples
///
/// ```
/// use folio::writer::escape_latex;
///
/// assert_eq!(escape_latex("50% of $10"), "50\\% of \\$10");
/// ```
pub fn escape_latex(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                result.push('\\');
                result.push(c);
            }
            '~' => result.push_str("\\textasciitilde{}"),
            '^' => result.push_str("\\textasciicircum{}"),
            '\\' => result.push_str("\\textbackslash{}"),
            '<' => result.push_str("\\textless{}"),
            '>' => result.push_str("\\textgreater{}"),
            _ => result.push(c),
        }
    }
    result
}

/// Replace each run of newlines with one space, for text that must stay on
/// one line (headings, table cells).
pub(crate) fn single_line(text: &str) -> Cow<'_, str> {
    if !text.contains('\n') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut after_newline = false;
    for c in text.chars() {
        if c == '\n' {
            if !after_newline {
                out.push(' ');
            }
            after_newline = true;
        } else {
            out.push(c);
            after_newline = false;
        }
    }
    Cow::Owned(out)
}

/// Digits of a `#rrggbb` color, uppercased; `None` for anything else.
pub(crate) fn hex_color(color: &str) -> Option<String> {
    let hex = color.strip_prefix('#')?;
    (hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())).then(|| hex.to_ascii_uppercase())
}

/// A font family list that is safe inside a `style` attribute: names made of
/// letters, digits, spaces, `-` and `_`, separated by commas.
pub(crate) fn font_family(family: &str) -> Option<&str> {
    let family = family.trim();
    let safe = family
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | ','));
    (safe && family.split(',').all(|name| !name.trim().is_empty())).then_some(family)
}

/// Generate a GitHub-style slug from text.
///
/// Converts text to lowercase, replaces spaces and separators with hyphens,
/// and removes consecutive/leading/trailing hyphens.
///
/// # Examples
///
/// ```
/// use folio::writer::slugify;
///
/// assert_eq!(slugify("Chapter One"), "chapter-one");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Hands out slugs that are unique within one document.
///
/// Repeats get a numeric suffix (`intro`, `intro-1`, `intro-2`); text with
/// no usable characters becomes `section`.
#[derive(Debug, Default)]
pub(crate) struct Slugger {
    used: HashSet<String>,
}

impl Slugger {
    pub(crate) fn unique(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }

        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
