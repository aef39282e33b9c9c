//! `{name}` placeholder parsing and substitution.

use std::borrow::Cow;

use crate::api::{ClientError, Result};

/// A piece of a parsed template: literal text or a placeholder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    Alias(&'a str),
}

fn is_alias_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a template into literal runs and `{name}` placeholders.
///
/// Braces that do not enclose a valid alias name (`{}`, `{"a":1}`, a lone
/// `{`) stay literal text.
pub(crate) fn parse(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find('{') {
        let open = cursor + offset;
        let rest = &template[open + 1..];
        let name_len = rest.find(|c: char| !is_alias_char(c)).unwrap_or(rest.len());

        if name_len > 0 && rest[name_len..].starts_with('}') {
            if open > literal_start {
                segments.push(Segment::Literal(&template[literal_start..open]));
            }
            segments.push(Segment::Alias(&rest[..name_len]));
            cursor = open + 1 + name_len + 1;
            literal_start = cursor;
        } else {
            cursor = open + 1;
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    segments
}

/// Distinct alias names referenced by a template, in first-seen order.
pub(crate) fn referenced_names<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
    let mut names: Vec<&str> = Vec::new();
    for segment in segments {
        if let Segment::Alias(name) = segment {
            if !names.contains(name) {
                names.push(name);
            }
        }
    }
    names
}

/// Substitute every placeholder using `values`, which must be positionally
/// aligned with `referenced_names`. Fails on the first missing alias without
/// producing any output.
pub(crate) fn render<'a>(
    template: &'a str,
    segments: &[Segment<'_>],
    names: &[&str],
    values: &[Option<String>],
) -> Result<Cow<'a, str>> {
    if names.is_empty() {
        return Ok(Cow::Borrowed(template));
    }

    if let Some(missing) = names
        .iter()
        .zip(values)
        .find_map(|(name, value)| value.is_none().then_some(*name))
    {
        return Err(ClientError::UnknownAlias(missing.to_string()));
    }

    let mut out = String::with_capacity(template.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Alias(name) => {
                let idx = names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| ClientError::UnknownAlias(name.to_string()))?;
                match &values[idx] {
                    Some(value) => out.push_str(value),
                    None => return Err(ClientError::UnknownAlias(name.to_string())),
                }
            }
        }
    }
    Ok(Cow::Owned(out))
}
