//! Entity handling for text kept in escaped form and for markup written by hand.
use aho_corasick::AhoCorasick;
use memchr::memchr;
use once_cell::sync::Lazy;

static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape the characters that may not appear literally in attribute values.
///
/// # Examples
///
/// ```
/// use docx_merge::common::xml::escape_xml;
/// assert_eq!(escape_xml("/word/a&b.xml"), "/word/a&amp;b.xml");
/// assert_eq!(escape_xml("\"<x>\""), "&quot;&lt;x&gt;&quot;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Resolve the predefined entities and character references in escaped text.
///
/// Anything that is not a well-formed reference is copied through unchanged.
///
/// # Examples
///
/// ```
/// use docx_merge::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&#65;&#x42;"), "AB");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("&bogus; &amp"), "&bogus; &amp");
/// ```
pub fn unescape_xml(s: &str) -> String {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return s.to_string();
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut pos = first;
    while pos < s.len() {
        let rest = &s[pos..];
        if let Some(end) = memchr(b';', rest.as_bytes())
            && let Some(c) = resolve_reference(&rest[1..end])
        {
            out.push(c);
            pos += end + 1;
        } else {
            out.push('&');
            pos += 1;
        }
        match memchr(b'&', &bytes[pos..]) {
            Some(next) => {
                out.push_str(&s[pos..pos + next]);
                pos += next;
            },
            None => {
                out.push_str(&s[pos..]);
                break;
            },
        }
    }
    out
}

/// The character named by the body of a reference (between `&` and `;`).
fn resolve_reference(body: &str) -> Option<char> {
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = match body.strip_prefix('#')? {
                hex if hex.starts_with(['x', 'X']) => u32::from_str_radix(&hex[1..], 16).ok()?,
                dec => dec.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        },
    }
}
