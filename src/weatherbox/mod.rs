//! Best-effort extraction of template invocations from wikitext.
//!
//! This is not a template expander: it finds `{{Name | key = value | ...}}`,
//! balances nested `{{ }}` and `[[ ]]` so that pipes inside links or inner
//! templates don't split parameters, and returns the named parameters as raw
//! strings. Anything it cannot make sense of is dropped rather than reported.

use std::{borrow::Cow, collections::BTreeMap, sync::LazyLock};

use regex::Regex;


static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(-->|$)").expect("valid comment regex"));

static INVOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}|\[\]]+?)\s*(\||\}\})").expect("valid template regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

/// Finds the first invocation of the template called `name`.
pub fn find_template(wikitext: &str, name: &str) -> Option<Template> {
    let text = strip_comments(wikitext);
    let wanted = normalize_name(name);

    INVOCATION
        .captures_iter(&text)
        .find(|caps| normalize_name(&caps[1]) == wanted)
        .and_then(|caps| caps.get(0))
        .map(|m| {
            let body = template_body(&text, m.start());
            Template {
                name: name.to_string(),
                params: named_params(body),
            }
        })
}

/// Finds a transcluded template whose name contains `marker`, such as
/// `{{Tokyo weatherbox}}`, and returns its name.
pub fn find_transcluded(wikitext: &str, marker: &str) -> Option<String> {
    let text = strip_comments(wikitext);
    let marker = marker.to_lowercase();

    INVOCATION
        .captures_iter(&text)
        .map(|caps| caps[1].trim().to_string())
        .find(|name| normalize_name(name).contains(&marker))
        .map(|name| match name.split_once(':') {
            Some((ns, rest)) if ns.trim().eq_ignore_ascii_case("template") => {
                rest.trim().to_string()
            }
            _ => name,
        })
}

fn strip_comments(wikitext: &str) -> Cow<'_, str> {
    COMMENT.replace_all(wikitext, "")
}

fn normalize_name(name: &str) -> String {
    let name = name.trim();
    let name = match name.split_once(':') {
        Some((ns, rest)) if ns.trim().eq_ignore_ascii_case("template") => rest,
        _ => name,
    };

    name.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns the text between `{{` at `start` and its matching `}}`. An
/// unterminated invocation runs to the end of the text.
fn template_body(text: &str, start: usize) -> &str {
    let bytes = text.as_bytes();
    let open = start + 2;
    let mut depth = 1usize;
    let mut i = open;

    while i < bytes.len() {
        match &bytes[i..] {
            [b'{', b'{', ..] => {
                depth += 1;
                i += 2;
            }
            [b'}', b'}', ..] => {
                depth -= 1;
                if depth == 0 {
                    return &text[open..i];
                }
                i += 2;
            }
            _ => i += 1,
        }
    }

    &text[open..]
}

/// Splits a template body on top-level pipes and keeps `key = value` pairs.
fn named_params(body: &str) -> BTreeMap<String, String> {
    let bytes = body.as_bytes();
    let mut segments = Vec::new();
    let mut braces = 0usize;
    let mut links = 0usize;
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match &bytes[i..] {
            [b'{', b'{', ..] => {
                braces += 1;
                i += 2;
            }
            [b'}', b'}', ..] => {
                braces = braces.saturating_sub(1);
                i += 2;
            }
            [b'[', b'[', ..] => {
                links += 1;
                i += 2;
            }
            [b']', b']', ..] => {
                links = links.saturating_sub(1);
                i += 2;
            }
            [b'|', ..] if braces == 0 && links == 0 => {
                segments.push(&body[segment_start..i]);
                segment_start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    segments.push(&body[segment_start..]);

    // the first segment is the template name
    segments
        .into_iter()
        .skip(1)
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || key.contains("{{") || key.contains("[[") {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}
