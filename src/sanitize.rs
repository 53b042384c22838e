//! Removal of characters that XML-based and markup output formats reject.

use std::borrow::Cow;

/// Check whether a character survives sanitization.
#[inline]
pub fn is_allowed_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || c as u32 >= 32
}

/// Strip NUL and other control characters from `text`.
///
/// Tab, newline and carriage return are kept, as is every character with a
/// code point of 32 or above. Returns the input unchanged (without
/// allocating) when nothing needs to be removed.
///
/// # Example
///
/// ```
/// use docrecon::sanitize::sanitize;
///
/// assert_eq!(sanitize("a\u{0}b\tc"), "ab\tc");
/// ```
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_allowed_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_allowed_char(c)).collect())
    }
}

/// Sanitize optional text; `None` yields an empty string.
pub fn sanitize_opt(text: Option<&str>) -> String {
    text.map(|t| sanitize(t).into_owned()).unwrap_or_default()
}
