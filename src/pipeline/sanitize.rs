//! Title sanitization: map an arbitrary document title to a single
//! filesystem-safe path segment.
//!
//! The function is total — every string input, including the empty string,
//! yields a usable segment — and idempotent, so a destination directory that
//! was already named by a sanitized title resolves to itself on re-runs.

/// Returned when sanitization leaves nothing usable.
pub const FALLBACK_NAME: &str = "untitled";

/// Maximum length of the produced segment, in characters.
const MAX_SEGMENT_CHARS: usize = 120;

/// Characters that are illegal in file names on common filesystems.
const ILLEGAL: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitize an arbitrary title into a non-empty path segment.
///
/// Rules, applied in order: trim surrounding whitespace; whitespace runs and
/// illegal/control characters become `_`; any remaining character outside
/// [ASCII alphanumeric, Unicode letters, `-`, `_`] becomes `_`; `_` runs
/// collapse to one; edge `_` are stripped; the result is truncated to 120
/// characters without leaving a trailing `_`; an empty result falls back to
/// [`FALLBACK_NAME`].
pub fn sanitize_title(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for c in raw.trim().chars() {
        let keep = c == '-'
            || c == '_'
            || c.is_ascii_alphanumeric()
            || (!c.is_ascii() && c.is_alphabetic());
        let illegal = c.is_whitespace() || c.is_control() || ILLEGAL.contains(&c);

        if keep && !illegal {
            // Literal underscores join the collapse rule below.
            if c != '_' || !out.ends_with('_') {
                out.push(c);
            }
        } else if !out.ends_with('_') {
            // Collapse runs as we go: whitespace runs, illegal chars, and
            // disallowed symbols all funnel into a single underscore.
            out.push('_');
        }
    }

    let trimmed: String = out.trim_matches('_').chars().take(MAX_SEGMENT_CHARS).collect();
    let result = trimmed.trim_end_matches('_');

    if result.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        result.to_string()
    }
}
