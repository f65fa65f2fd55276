//! General string helpers shared across code generation.

use phf::phf_set;

/// Characters that force a prop name to be emitted as a quoted key.
static PROP_NAME_ESCAPE_SYMBOLS: phf::Set<char> = phf_set! {
    ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '.', '/', ':',
    ';', '<', '=', '>', '?', '@', '[', '\\', ']', '^', '`', '{', '|', '}', '~', '-',
};

/// Check if a string is a plain JavaScript identifier (`[A-Za-z_$][\w$]*`).
#[inline]
pub fn is_simple_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Quote a prop name when it cannot be used as a bare object key.
pub fn get_escaped_prop_name(key: &str) -> String {
    if key.chars().any(|c| PROP_NAME_ESCAPE_SYMBOLS.contains(&c)) {
        to_json_string(key)
    } else {
        key.to_string()
    }
}

/// Serialize a string as a JSON (and therefore JavaScript) string literal.
pub fn to_json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Advance `from` past any whitespace in `source`, returning the first non-whitespace offset.
#[inline]
pub fn skip_whitespace(source: &str, from: usize) -> usize {
    match source.get(from..) {
        Some(rest) => from + (rest.len() - rest.trim_start().len()),
        None => from,
    }
}
