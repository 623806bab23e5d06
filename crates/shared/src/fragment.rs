//! Extraction of the word-edit form out of a loaded HTML fragment.
//!
//! The backend returns server-rendered fragments, not arbitrary documents,
//! so a tolerant single-pass scanner is enough: it locates the first
//! `<form>`, reads its `action` and `method`, and collects the fields a
//! browser would submit from `<input>`, `<textarea>` and `<select>`
//! elements in document order.

use thiserror::Error;

use crate::domain::{FormField, FormMethod, WordForm};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormParseError {
    #[error("fragment contains no form element")]
    MissingForm,
    #[error("form has no action attribute")]
    MissingAction,
    #[error("form declares unsupported method {0:?}")]
    UnsupportedMethod(String),
}

/// Parse the first form of `fragment` into a [`WordForm`].
pub fn extract_form(fragment: &str) -> Result<WordForm, FormParseError> {
    let form_tag = find_open_tag(fragment, 0, "form").ok_or(FormParseError::MissingForm)?;
    let attrs = parse_attributes(form_tag.attributes(fragment));

    let action = attr_value(&attrs, "action")
        .filter(|value| !value.is_empty())
        .ok_or(FormParseError::MissingAction)?
        .to_string();
    let method = match attr_value(&attrs, "method") {
        None => FormMethod::Get,
        Some(raw) => FormMethod::parse(raw)
            .ok_or_else(|| FormParseError::UnsupportedMethod(raw.to_string()))?,
    };

    let body_end = find_close_tag(fragment, form_tag.end, "form").unwrap_or(fragment.len());
    let fields = collect_fields(&fragment[form_tag.end..body_end]);

    Ok(WordForm {
        action,
        method,
        fields,
    })
}

/// Span of an opening tag: `attr_start` points just past the tag name,
/// `end` just past the closing `>`.
#[derive(Debug, Clone, Copy)]
struct TagSpan {
    start: usize,
    attr_start: usize,
    end: usize,
}

impl TagSpan {
    fn attributes<'a>(&self, html: &'a str) -> &'a str {
        // Exclude the trailing '>'.
        &html[self.attr_start..self.end - 1]
    }
}

fn find_open_tag(html: &str, from: usize, name: &str) -> Option<TagSpan> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{name}");
    let mut at = from;
    while let Some(rel) = lower[at..].find(&needle) {
        let start = at + rel;
        let attr_start = start + needle.len();
        let boundary = lower[attr_start..].chars().next();
        if matches!(boundary, Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/') {
            let end = scan_tag_end(html, attr_start)?;
            return Some(TagSpan {
                start,
                attr_start,
                end,
            });
        }
        at = attr_start;
    }
    None
}

fn find_close_tag(html: &str, from: usize, name: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("</{name}");
    lower[from..].find(&needle).map(|rel| from + rel)
}

/// Index just past the `>` that terminates a tag opened before `from`,
/// skipping over quoted attribute values.
fn scan_tag_end(html: &str, from: usize) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        match (quote, bytes[i]) {
            (Some(open), byte) if byte == open => quote = None,
            (Some(_), _) => {}
            (None, b'"') => quote = Some(b'"'),
            (None, b'\'') => quote = Some(b'\''),
            (None, b'>') => return Some(i + 1),
            (None, _) => {}
        }
        i += 1;
    }
    None
}

/// Attribute names are lowercased; values are entity-decoded. A bare
/// boolean attribute (`checked`, `selected`) parses to an empty value.
fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    let bytes = raw.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'='
            && bytes[i] != b'/'
        {
            i += 1;
        }
        if i == name_start {
            break;
        }
        let name = raw[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let value = if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let open = bytes[i];
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != open {
                    i += 1;
                }
                let value = &raw[value_start..i];
                if i < bytes.len() {
                    i += 1;
                }
                value
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &raw[value_start..i]
            };
            attrs.push((name, decode_entities(value)));
        } else {
            attrs.push((name, String::new()));
        }
    }
    attrs
}

fn attr_value<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(attr, _)| attr == name)
        .map(|(_, value)| value.as_str())
}

fn has_attr(attrs: &[(String, String)], name: &str) -> bool {
    attrs.iter().any(|(attr, _)| attr == name)
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collect_fields(body: &str) -> Vec<FormField> {
    let mut fields = Vec::new();
    let mut at = 0;
    loop {
        let next = ["input", "textarea", "select"]
            .iter()
            .filter_map(|tag| find_open_tag(body, at, tag).map(|span| (*tag, span)))
            .min_by_key(|(_, span)| span.start);
        let Some((tag, span)) = next else {
            break;
        };
        match tag {
            "input" => {
                at = span.end;
                if let Some(field) = input_field(parse_attributes(span.attributes(body))) {
                    fields.push(field);
                }
            }
            "textarea" => {
                let attrs = parse_attributes(span.attributes(body));
                let content_end = find_close_tag(body, span.end, "textarea").unwrap_or(body.len());
                if let Some(name) = attr_value(&attrs, "name").filter(|n| !n.is_empty()) {
                    fields.push(FormField::new(
                        name,
                        decode_entities(&body[span.end..content_end]),
                    ));
                }
                at = content_end;
            }
            "select" => {
                let attrs = parse_attributes(span.attributes(body));
                let content_end = find_close_tag(body, span.end, "select").unwrap_or(body.len());
                if let Some(name) = attr_value(&attrs, "name").filter(|n| !n.is_empty()) {
                    if let Some(value) = selected_option(&body[span.end..content_end]) {
                        fields.push(FormField::new(name, value));
                    }
                }
                at = content_end;
            }
            _ => unreachable!(),
        }
    }
    fields
}

/// Fields a browser would include for an `<input>`: named, not a button,
/// and for checkboxes/radios only when checked (value defaults to `on`).
fn input_field(attrs: Vec<(String, String)>) -> Option<FormField> {
    let name = attr_value(&attrs, "name").filter(|n| !n.is_empty())?;
    let kind = attr_value(&attrs, "type").unwrap_or("text").to_string();
    match kind.as_str() {
        "submit" | "button" | "reset" | "image" | "file" => None,
        "checkbox" | "radio" => {
            if !has_attr(&attrs, "checked") {
                return None;
            }
            let value = attr_value(&attrs, "value").unwrap_or("on");
            Some(FormField::new(name, value))
        }
        _ => Some(FormField::new(name, attr_value(&attrs, "value").unwrap_or(""))),
    }
}

/// Value the select would submit: the first `selected` option, falling
/// back to the first option, with the option text standing in for a
/// missing `value` attribute.
fn selected_option(body: &str) -> Option<String> {
    let mut first = None;
    let mut at = 0;
    while let Some(span) = find_open_tag(body, at, "option") {
        let attrs = parse_attributes(span.attributes(body));
        let text_end = body[span.end..]
            .find('<')
            .map(|rel| span.end + rel)
            .unwrap_or(body.len());
        let value = match attr_value(&attrs, "value") {
            Some(value) => value.to_string(),
            None => decode_entities(body[span.end..text_end].trim()),
        };
        if has_attr(&attrs, "selected") {
            return Some(value);
        }
        first.get_or_insert(value);
        at = text_end;
    }
    first
}

#[cfg(test)]
#[path = "tests/fragment_tests.rs"]
mod tests;
