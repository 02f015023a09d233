//! Warning records and the accumulator threaded through sanitizing.

use std::fmt;

/// Kind of anomaly a [`Warning`] reports.
///
/// [`Issue::as_str`] yields a stable short tag suitable for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Issue {
    /// Control characters or invalid code points were removed from text.
    TextSanitized,
    EmptyChapterTitle,
    /// A heading paragraph has no visible text.
    EmptyHeading,
    EmptyLinkUrl,
    /// Leading or trailing whitespace was trimmed from a link URL.
    LinkUrlWhitespace,
    /// A link URL used a script-executing scheme or contained markup.
    UnsafeLinkUrl,
    EmptyImageUrl,
}

impl Issue {
    pub fn as_str(self) -> &'static str {
        match self {
            Issue::TextSanitized => "text content sanitized",
            Issue::EmptyChapterTitle => "empty chapter title",
            Issue::EmptyHeading => "empty heading payload",
            Issue::EmptyLinkUrl => "empty link URL",
            Issue::LinkUrlWhitespace => "link URL has whitespace",
            Issue::UnsafeLinkUrl => "link URL has unsafe content",
            Issue::EmptyImageUrl => "empty image URL",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A correction (or flag) made while sanitizing a book.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Warning {
    /// Path-like locator, e.g. `body[2].runs[0].link.url`.
    pub location: String,
    pub issue: Issue,
    /// Value before correction.
    pub original: String,
    /// Value after correction (placeholder, cleaned value, or unchanged).
    pub fixed: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({:?} -> {:?})",
            self.location, self.issue, self.original, self.fixed
        )
    }
}

/// Ordered warning accumulator.
///
/// Each sanitize call owns one log and passes it down by `&mut`, so separate
/// calls never share state.
#[derive(Debug, Default)]
pub struct WarningLog {
    warnings: Vec<Warning>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        location: impl Into<String>,
        issue: Issue,
        original: impl Into<String>,
        fixed: impl Into<String>,
    ) {
        let warning = Warning {
            location: location.into(),
            issue,
            original: original.into(),
            fixed: fixed.into(),
        };
        log::debug!("sanitize: {warning}");
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.warnings
    }
}
