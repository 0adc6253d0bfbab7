//! A small subset of CSS selectors.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`
//! (value bare or quoted), compounds of those, the descendant combinator and
//! comma-separated lists.
use std::str::FromStr;

use super::dom::SimElement;
use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, element: &SimElement) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id().as_ref() != Some(id) {
                return false;
            }
        }
        let classes = element.classes();
        if !self.classes.iter().all(|class| classes.contains(class)) {
            return false;
        }
        self.attributes.iter().all(|(name, value)| match value {
            None => element.has_attribute(name),
            Some(value) => element.attribute(name).as_ref() == Some(value),
        })
    }
}

/// A parsed selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    /// Each alternative is a descendant chain, outermost first.
    alternatives: Vec<Vec<Compound>>,
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        Selector::parse(source)
    }
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = || Error::Selector(source.to_string());
        let mut alternatives = vec![];
        for group in split_outside_brackets(source, |c| c == ',') {
            let chain = split_outside_brackets(group, char::is_whitespace)
                .into_iter()
                .filter(|part| !part.is_empty())
                .map(|part| parse_compound(part).ok_or_else(invalid))
                .collect::<Result<Vec<_>>>()?;
            if chain.is_empty() {
                return Err(invalid());
            }
            alternatives.push(chain);
        }
        Ok(Selector { alternatives })
    }

    pub fn matches(&self, element: &SimElement) -> bool {
        self.alternatives
            .iter()
            .any(|chain| chain_matches(chain, element))
    }
}

/// Descendant chains match greedily from the right.
fn chain_matches(chain: &[Compound], element: &SimElement) -> bool {
    let Some((last, mut remaining)) = chain.split_last() else {
        return false;
    };
    if !last.matches(element) {
        return false;
    }
    let mut current = element.parent();
    while let Some((wanted, rest)) = remaining.split_last() {
        loop {
            match current {
                None => return false,
                Some(node) => {
                    current = node.parent();
                    if wanted.matches(&node) {
                        break;
                    }
                }
            }
        }
        remaining = rest;
    }
    true
}

fn split_outside_brackets(source: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if depth > 0 => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && is_separator(c) => {
                parts.push(&source[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_ident_char)
}

fn take_ident(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    s.split_at(end)
}

fn unquote(value: &str) -> Option<String> {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return Some(value[1..value.len() - 1].to_string());
        }
    }
    is_ident(value).then(|| value.to_string())
}

fn parse_compound(source: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = source;
    if let Some(after) = rest.strip_prefix('*') {
        rest = after;
    } else {
        let (tag, after) = take_ident(rest);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
            rest = after;
        }
    }

    while let Some(c) = rest.chars().next() {
        match c {
            '#' | '.' => {
                let (name, after) = take_ident(&rest[1..]);
                if name.is_empty() {
                    return None;
                }
                if c == '#' {
                    compound.id = Some(name.to_string());
                } else {
                    compound.classes.push(name.to_string());
                }
                rest = after;
            }
            '[' => {
                let end = rest.find(']')?;
                let inner = &rest[1..end];
                rest = &rest[end + 1..];
                let attribute = match inner.split_once('=') {
                    None => (inner.trim().to_string(), None),
                    Some((name, value)) => (name.trim().to_string(), Some(unquote(value.trim())?)),
                };
                if !is_ident(&attribute.0) {
                    return None;
                }
                compound.attributes.push(attribute);
            }
            _ => return None,
        }
    }
    Some(compound)
}
