//! Additional string helpers.

use std::fmt::Write;

/// Replaces every run of whitespace (including newlines) by a single space, and trims both ends.
///
/// Conditions spanning several lines then still fit on one row of the results file.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes `s` so it can be placed between the double quotes of a C string literal.
///
/// Control characters become 3-digit octal escapes, which unlike `\x` escapes cannot swallow a following character.
/// A `?` followed by another `?` is escaped to avoid forming a trigraph.
pub fn escape_c_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 2);
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '?' if chars.peek() == Some(&'?') => escaped.push_str("\\?"),
            c if c.is_ascii_control() => {
                write!(escaped, "\\{:03o}", c as u32).expect("write to string");
            },
            c => escaped.push(c),
        }
    }
    escaped
}

#[test]
fn test_collapse_whitespace() {
    assert_eq!(collapse_whitespace("  a &&\n\t   b  "), "a && b");
    assert_eq!(collapse_whitespace(""), "");
}

#[test]
fn test_escape_c_string() {
    assert_eq!(escape_c_string(r#"strcmp(s, "\"") == 0"#), r#"strcmp(s, \"\\\"\") == 0"#);
    assert_eq!(escape_c_string("a\tb\nc"), "a\\tb\\nc");
    assert_eq!(escape_c_string("x ?? y"), "x \\?? y");
    assert_eq!(escape_c_string("\u{7}1"), "\\0071");
    assert_eq!(escape_c_string("%d"), "%d");
}
