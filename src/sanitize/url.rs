//! Link URL validation.
//!
//! One policy applies throughout: a URL with a script-executing scheme or any
//! markup characters is replaced wholesale by [`UNSAFE_URL_PLACEHOLDER`].
//! Characters are never stripped piecemeal from such values.

use percent_encoding::percent_decode_str;

use super::warning::Issue;

/// Replacement for URLs that could execute script or inject markup.
pub const UNSAFE_URL_PLACEHOLDER: &str = "about:blank";

/// Replacement for empty link URLs.
pub const EMPTY_URL_PLACEHOLDER: &str = "#";

/// Schemes that execute code or embed arbitrary content when followed.
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "livescript:", "data:"];

/// Longest blocked scheme; the check never needs more characters.
const SCHEME_PREFIX_LEN: usize = 16;

/// Result of [`validate_link_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCheck {
    /// URL to use in place of the input.
    pub url: String,
    /// The most severe problem found, if any.
    pub issue: Option<Issue>,
}

/// Validate a link URL.
///
/// At most one issue is reported, the most severe one:
/// unsafe content, then empty value, then surrounding whitespace.
///
/// # Examples
///
/// ```
/// use folio::sanitize::{validate_link_url, Issue, UNSAFE_URL_PLACEHOLDER};
///
/// let check = validate_link_url("  https://example.com  ");
/// assert_eq!(check.url, "https://example.com");
/// assert_eq!(check.issue, Some(Issue::LinkUrlWhitespace));
///
/// let check = validate_link_url("https://x.org/<script>alert(1)</script>");
/// assert_eq!(check.url, UNSAFE_URL_PLACEHOLDER);
/// assert_eq!(check.issue, Some(Issue::UnsafeLinkUrl));
/// ```
pub fn validate_link_url(raw: &str) -> UrlCheck {
    if is_unsafe(raw) {
        return UrlCheck {
            url: UNSAFE_URL_PLACEHOLDER.to_string(),
            issue: Some(Issue::UnsafeLinkUrl),
        };
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UrlCheck {
            url: EMPTY_URL_PLACEHOLDER.to_string(),
            issue: Some(Issue::EmptyLinkUrl),
        };
    }

    if trimmed.len() != raw.len() {
        return UrlCheck {
            url: trimmed.to_string(),
            issue: Some(Issue::LinkUrlWhitespace),
        };
    }

    UrlCheck {
        url: raw.to_string(),
        issue: None,
    }
}

/// True if the URL carries markup or a blocked scheme.
///
/// The scheme prefix is percent-decoded and stripped of whitespace and control
/// characters, which browsers ignore inside a scheme.
pub fn is_unsafe(raw: &str) -> bool {
    if memchr::memchr2(b'<', b'>', raw.as_bytes()).is_some() {
        return true;
    }

    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    if decoded.contains(['<', '>']) {
        return true;
    }

    let prefix: String = decoded
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(SCHEME_PREFIX_LEN)
        .flat_map(char::to_lowercase)
        .collect();

    BLOCKED_SCHEMES.iter().any(|scheme| prefix.starts_with(scheme))
}
