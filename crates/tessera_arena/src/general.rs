//! String case helpers and identifier predicates.
//!
//! The case conversions are pure, so their results are memoized in
//! process-wide caches shared by every compile.

use compact_str::CompactString;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use phf::phf_set;

static CAMELIZE_CACHE: Lazy<DashMap<CompactString, CompactString>> = Lazy::new(DashMap::new);
static HYPHENATE_CACHE: Lazy<DashMap<CompactString, CompactString>> = Lazy::new(DashMap::new);
static CAPITALIZE_CACHE: Lazy<DashMap<CompactString, CompactString>> = Lazy::new(DashMap::new);

fn cached(
    cache: &DashMap<CompactString, CompactString>,
    input: &str,
    f: impl FnOnce(&str) -> CompactString,
) -> CompactString {
    if let Some(hit) = cache.get(input) {
        return hit.value().clone();
    }
    let value = f(input);
    cache.insert(CompactString::from(input), value.clone());
    value
}

/// `foo-bar` → `fooBar`
pub fn camelize(s: &str) -> CompactString {
    cached(&CAMELIZE_CACHE, s, |s| {
        let mut out = CompactString::with_capacity(s.len());
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '-' {
                match chars.peek() {
                    Some(next) if next.is_ascii_alphanumeric() || *next == '_' => {
                        out.push(next.to_ascii_uppercase());
                        chars.next();
                    }
                    _ => out.push(c),
                }
            } else {
                out.push(c);
            }
        }
        out
    })
}

/// `fooBar` → `foo-bar`
pub fn hyphenate(s: &str) -> CompactString {
    cached(&HYPHENATE_CACHE, s, |s| {
        let mut out = CompactString::with_capacity(s.len() + 4);
        for (i, c) in s.char_indices() {
            if c.is_ascii_uppercase() {
                if i > 0 {
                    out.push('-');
                }
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    })
}

/// `foo` → `Foo`
pub fn capitalize(s: &str) -> CompactString {
    cached(&CAPITALIZE_CACHE, s, |s| {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => {
                let mut out = CompactString::with_capacity(s.len());
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
                out
            }
            None => CompactString::default(),
        }
    })
}

/// `click` → `onClick`, `update:modelValue` → `onUpdate:modelValue`
pub fn to_handler_key(s: &str) -> CompactString {
    if s.is_empty() {
        return CompactString::default();
    }
    let mut out = CompactString::from("on");
    out.push_str(&capitalize(s));
    out
}

/// Globals that template expressions may reference without a context prefix.
pub static GLOBALS_ALLOWED: phf::Set<&'static str> = phf_set! {
    "Infinity", "undefined", "NaN", "isFinite", "isNaN", "parseFloat",
    "parseInt", "decodeURI", "decodeURIComponent", "encodeURI",
    "encodeURIComponent", "Math", "Number", "Date", "Array", "Object",
    "Boolean", "String", "RegExp", "Map", "Set", "JSON", "Intl", "BigInt",
    "console", "Error", "Symbol"
};

#[inline]
pub fn is_globally_allowed(name: &str) -> bool {
    GLOBALS_ALLOWED.contains(name)
}

/// Keywords that look like identifiers but are literal values.
#[inline]
pub fn is_literal_whitelisted(name: &str) -> bool {
    matches!(name, "true" | "false" | "null" | "this")
}

/// `[A-Za-z_$][\w$]*`
pub fn is_simple_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a string for inclusion in markup.
pub fn escape_html(s: &str) -> CompactString {
    let mut out = CompactString::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text placed inside a markup comment.
pub fn escape_html_comment(s: &str) -> CompactString {
    let mut out = CompactString::from(s);
    while out.contains("<!--") || out.contains("-->") || out.contains("--!>") {
        out = out
            .replace("<!--", "")
            .replace("--!>", "")
            .replace("-->", "")
            .into();
    }
    out
}

/// Serialize a string as a JavaScript double-quoted literal.
pub fn to_js_string_literal(s: &str) -> CompactString {
    let mut out = CompactString::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("foo-bar"), "fooBar");
        assert_eq!(camelize("foo-bar-baz"), "fooBarBaz");
        assert_eq!(camelize("foo"), "foo");
        assert_eq!(camelize("update:model-value"), "update:modelValue");
    }

    #[test]
    fn test_hyphenate() {
        assert_eq!(hyphenate("fooBar"), "foo-bar");
        assert_eq!(hyphenate("FooBar"), "foo-bar");
        assert_eq!(hyphenate("foo"), "foo");
    }

    #[test]
    fn test_capitalize_and_handler_key() {
        assert_eq!(capitalize("click"), "Click");
        assert_eq!(capitalize(""), "");
        assert_eq!(to_handler_key("click"), "onClick");
        assert_eq!(to_handler_key("update:modelValue"), "onUpdate:modelValue");
    }

    #[test]
    fn test_cache_is_consistent() {
        let first = camelize("cache-me");
        let second = camelize("cache-me");
        assert_eq!(first, second);
    }

    #[test]
    fn test_identifier_predicates() {
        assert!(is_simple_identifier("foo"));
        assert!(is_simple_identifier("$foo_1"));
        assert!(!is_simple_identifier("1foo"));
        assert!(!is_simple_identifier("foo.bar"));
        assert!(is_globally_allowed("Math"));
        assert!(!is_globally_allowed("window"));
        assert!(is_literal_whitelisted("this"));
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(to_js_string_literal("a\"b\nc"), "\"a\\\"b\\nc\"");
        assert_eq!(escape_html("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
    }
}
