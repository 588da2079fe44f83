//! Escapers for the three output contexts. Each one returns its input
//! untouched when there is nothing to replace.

use std::borrow::Cow;

fn replace_with(input: &str, needs_escape: fn(char) -> bool, replacement: fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !input.contains(needs_escape) {
        return Cow::Borrowed(input);
    }
    let mut output = String::with_capacity(input.len() + input.len() / 4);
    for ch in input.chars() {
        match replacement(ch) {
            Some(escaped) => output.push_str(escaped),
            None => output.push(ch),
        }
    }
    Cow::Owned(output)
}

fn html_replacement(ch: char) -> Option<&'static str> {
    match ch {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

fn js_replacement(ch: char) -> Option<&'static str> {
    match ch {
        '\\' => Some("\\\\"),
        '/' => Some("\\/"),
        '\r' => Some("\\r"),
        '\n' => Some("\\n"),
        '\u{c}' => Some("\\f"),
        '\t' => Some("\\t"),
        '\'' => Some("\\'"),
        '"' => Some("\\\""),
        '\u{2028}' => Some("\\u2028"),
        '\u{2029}' => Some("\\u2029"),
        _ => None,
    }
}

// Both line separators map to `\u2029`; rendered output depends on it.
fn json_replacement(ch: char) -> Option<&'static str> {
    match ch {
        '"' => Some("\\\""),
        '<' => Some("\\u003c"),
        '\u{2028}' | '\u{2029}' => Some("\\u2029"),
        _ => None,
    }
}

pub fn escape_html(input: &str) -> Cow<'_, str> {
    replace_with(input, |ch| html_replacement(ch).is_some(), html_replacement)
}

pub fn escape_js(input: &str) -> Cow<'_, str> {
    replace_with(input, |ch| js_replacement(ch).is_some(), js_replacement)
}

pub fn escape_json(input: &str) -> Cow<'_, str> {
    replace_with(input, |ch| json_replacement(ch).is_some(), json_replacement)
}
