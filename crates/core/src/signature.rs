//! Call signatures and the annotated form used in diagnostics.
//!
//! A [`Signature`] is the callable's name plus its ordered parameter names.
//! Callers usually build one directly; [`Signature::parse`] recovers one from
//! the textual head of a declaration when only source text is at hand.

use serde::{Deserialize, Serialize};

use crate::types::ExpectedTypes;

/// The name and parameter list of a validated callable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    /// Everything before the opening parenthesis, e.g. `create_user` or
    /// `function create_user`. May be empty for anonymous callables.
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl Signature {
    pub fn new<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Extract a signature from a declaration head such as
    /// `fn create_user(name: &str, age: u8) -> User` or
    /// `function createUser(name, age = 18) {`.
    ///
    /// Type annotations and default values are dropped from parameter names.
    /// Returns `None` when the text has no balanced parameter list.
    pub fn parse(source: &str) -> Option<Self> {
        let open = source.find('(')?;
        let inner_start = open + 1;
        let close = inner_start + matching_close(&source[inner_start..])?;

        let name = source[..open].trim().to_string();
        let params = split_top_level(&source[inner_start..close])
            .into_iter()
            .map(param_name)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self { name, params })
    }

    /// Name of the parameter at a 1-based position.
    pub fn param(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.params.get(i))
            .map(String::as_str)
    }
}

/// Byte offset of the `)` closing a list whose `(` was just consumed.
fn matching_close(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested in brackets.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth -= 1,
            ',' if depth <= 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts
}

fn param_name(param: &str) -> &str {
    let end = param.find([':', '=']).unwrap_or(param.len());
    param[..end].trim()
}

/// Render `signature` with the parameter at `position` annotated as
/// `name: <type1|type2>`, e.g. `create_user( name: <string>, age )`.
///
/// Formatting is best-effort: an empty string is returned when `position`
/// does not address one of the signature's parameters.
pub fn describe_call(signature: &Signature, position: usize, expected: &ExpectedTypes) -> String {
    if signature.param(position).is_none() {
        return String::new();
    }

    let params: Vec<String> = signature
        .params
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i + 1 == position {
                format!("{name}: <{expected}>")
            } else {
                name.clone()
            }
        })
        .collect();

    format!("{}( {} )", signature.name, params.join(", "))
}
