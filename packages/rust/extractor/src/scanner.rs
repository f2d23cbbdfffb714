//! Marker discovery and balanced-literal scanning over raw module text.
//!
//! Module files look like:
//! ```text
//! // UUID: 0123456789abcdef0123456789abcdef
//! export const schema = { fields: { ... } };
//! ```

use regex::Regex;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches a `// UUID: <32 hex-or-hyphen chars>` comment marker.
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)//\s*UUID:\s*([a-f0-9-]{32})").expect("UUID regex")
});

/// Matches `export const schema =` with flexible whitespace.
static SCHEMA_EXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+const\s+schema\s*=\s*").expect("schema export regex")
});

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// Find the first `UUID:` marker and return its value in lower case.
pub fn find_uuid(source: &str) -> Option<String> {
    UUID_RE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Byte offset just past the first `export const schema =` anchor.
pub fn find_schema_start(source: &str) -> Option<usize> {
    SCHEMA_EXPORT_RE.find(source).map(|m| m.end())
}

// ---------------------------------------------------------------------------
// Balanced literal
// ---------------------------------------------------------------------------

/// Text delimited by the brace scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedLiteral<'a> {
    /// From the scan start through the closing brace, or to end of text when
    /// the braces never balance.
    pub text: &'a str,
    /// Whether a closing brace brought the depth back to zero.
    pub balanced: bool,
}

/// Scan forward from `start` to the brace that closes the literal.
///
/// Braces count only outside string literals. A `"`, `'` or `` ` `` opens a
/// string when none is open and closes the one it opened; a quote directly
/// after a backslash does neither. Only the single previous character is
/// checked, so `"\\"` is seen as still open.
pub fn scan_balanced_literal(source: &str, start: usize) -> ScannedLiteral<'_> {
    let rest = source.get(start..).unwrap_or("");
    let mut depth: i64 = 0;
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = source.get(..start).and_then(|head| head.chars().next_back());

    for (offset, ch) in rest.char_indices() {
        let escaped = prev == Some('\\');
        prev = Some(ch);

        if matches!(ch, '"' | '\'' | '`') && !escaped {
            match quote {
                None => {
                    quote = Some(ch);
                    continue;
                }
                Some(open) if open == ch => {
                    quote = None;
                    continue;
                }
                Some(_) => {}
            }
        }

        if quote.is_some() {
            continue;
        }

        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = offset + ch.len_utf8();
                    return ScannedLiteral {
                        text: &rest[..end],
                        balanced: true,
                    };
                }
            }
            _ => {}
        }
    }

    ScannedLiteral {
        text: rest,
        balanced: false,
    }
}
