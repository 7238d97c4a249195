//! Rule specifications, canonical rule names and parsed rules.
//!
//! A [`RuleSpec`] is what callers write (and what config files hold): a bare
//! rule name, or a single-entry mapping from rule name to argument. Parsing
//! turns it into a [`Rule`] whose variant carries a typed argument.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Inspect;

// ---------------------------------------------------------------------------
// Rule specifications
// ---------------------------------------------------------------------------

/// A rule as written by the caller.
///
/// In JSON: `"ALPHA"` or `{"IN-LIST": "red,green"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Name(String),
    WithArg(Map<String, Value>),
}

impl RuleSpec {
    pub fn with_arg(name: impl Into<String>, arg: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(name.into(), arg.into());
        Self::WithArg(map)
    }

    /// Resolve the rule name and argument into a typed [`Rule`].
    pub fn parse(&self) -> Result<Rule, RuleParseError> {
        let (raw_name, arg) = match self {
            RuleSpec::Name(name) => (name.as_str(), None),
            RuleSpec::WithArg(map) => match map.iter().next() {
                Some((name, arg)) if map.len() == 1 => (name.as_str(), Some(arg)),
                _ => {
                    return Err(RuleParseError::Malformed {
                        rule: map.keys().map(|k| normalize_rule_name(k)).collect::<Vec<_>>().join(","),
                        reason: format!(
                            "a rule mapping must hold exactly one entry, found {}",
                            map.len()
                        ),
                    })
                }
            },
        };

        let name: RuleName = raw_name.parse()?;
        Rule::build(name, arg)
    }
}

impl From<&str> for RuleSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for RuleSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<V: Into<Value>> From<(&str, V)> for RuleSpec {
    fn from((name, arg): (&str, V)) -> Self {
        Self::with_arg(name, arg)
    }
}

// ---------------------------------------------------------------------------
// Canonical names
// ---------------------------------------------------------------------------

/// Canonical rule names. Spelling variants such as `in-list`, `IN_LIST` and
/// `InList` all normalize to [`RuleName::InList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleName {
    Regex,
    Alpha,
    Number,
    Numeric,
    AlphaNumeric,
    NotStringEmpty,
    InList,
    NotInList,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

impl RuleName {
    pub const ALL: [RuleName; 12] = [
        RuleName::Regex,
        RuleName::Alpha,
        RuleName::Number,
        RuleName::Numeric,
        RuleName::AlphaNumeric,
        RuleName::NotStringEmpty,
        RuleName::InList,
        RuleName::NotInList,
        RuleName::GreaterThan,
        RuleName::GreaterThanEqual,
        RuleName::LessThan,
        RuleName::LessThanEqual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleName::Regex => "REGEX",
            RuleName::Alpha => "ALPHA",
            RuleName::Number => "NUMBER",
            RuleName::Numeric => "NUMERIC",
            RuleName::AlphaNumeric => "ALPHANUMERIC",
            RuleName::NotStringEmpty => "NOTSTRINGEMPTY",
            RuleName::InList => "INLIST",
            RuleName::NotInList => "NOTINLIST",
            RuleName::GreaterThan => "GREATERTHAN",
            RuleName::GreaterThanEqual => "GREATERTHANEQUAL",
            RuleName::LessThan => "LESSTHAN",
            RuleName::LessThanEqual => "LESSTHANEQUAL",
        }
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleName {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_rule_name(s);
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == normalized)
            .ok_or(RuleParseError::Unknown(normalized))
    }
}

/// Uppercase a rule name and drop `-` / `_` separators.
pub fn normalize_rule_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_uppercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Parsed rules
// ---------------------------------------------------------------------------

/// The allowed (or forbidden) values of a list rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListArg {
    /// Containment is a substring test against this text.
    Text(String),
    /// Containment is exact membership.
    Items(Vec<String>),
}

impl ListArg {
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            ListArg::Text(text) => text.contains(needle),
            ListArg::Items(items) => items.iter().any(|item| item == needle),
        }
    }
}

impl fmt::Display for ListArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListArg::Text(text) => write!(f, "{}", Value::from(text.as_str())),
            ListArg::Items(items) => write!(f, "{}", Value::from(items.clone())),
        }
    }
}

/// A rule with its argument resolved.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Fails when the pattern matches the value.
    Regex(Regex),
    Alpha,
    Number,
    Numeric,
    AlphaNumeric,
    NotStringEmpty,
    InList(ListArg),
    NotInList(ListArg),
    /// Comparison bounds are `None` when the argument has no leading
    /// integer; such a rule fails for every value.
    GreaterThan(Option<i64>),
    GreaterThanEqual(Option<i64>),
    LessThan(Option<i64>),
    LessThanEqual(Option<i64>),
}

impl Rule {
    pub fn name(&self) -> RuleName {
        match self {
            Rule::Regex(_) => RuleName::Regex,
            Rule::Alpha => RuleName::Alpha,
            Rule::Number => RuleName::Number,
            Rule::Numeric => RuleName::Numeric,
            Rule::AlphaNumeric => RuleName::AlphaNumeric,
            Rule::NotStringEmpty => RuleName::NotStringEmpty,
            Rule::InList(_) => RuleName::InList,
            Rule::NotInList(_) => RuleName::NotInList,
            Rule::GreaterThan(_) => RuleName::GreaterThan,
            Rule::GreaterThanEqual(_) => RuleName::GreaterThanEqual,
            Rule::LessThan(_) => RuleName::LessThan,
            Rule::LessThanEqual(_) => RuleName::LessThanEqual,
        }
    }

    fn build(name: RuleName, arg: Option<&Value>) -> Result<Self, RuleParseError> {
        let rule = match name {
            RuleName::Regex => {
                let pattern = arg_text(arg);
                let re = Regex::new(&pattern).map_err(|e| RuleParseError::Malformed {
                    rule: name.as_str().to_string(),
                    reason: format!("invalid pattern ({pattern}): {e}"),
                })?;
                Rule::Regex(re)
            }
            RuleName::Alpha => Rule::Alpha,
            RuleName::Number => Rule::Number,
            RuleName::Numeric => Rule::Numeric,
            RuleName::AlphaNumeric => Rule::AlphaNumeric,
            RuleName::NotStringEmpty => Rule::NotStringEmpty,
            RuleName::InList => Rule::InList(list_arg(arg)),
            RuleName::NotInList => Rule::NotInList(list_arg(arg)),
            RuleName::GreaterThan => Rule::GreaterThan(bound_arg(arg)),
            RuleName::GreaterThanEqual => Rule::GreaterThanEqual(bound_arg(arg)),
            RuleName::LessThan => Rule::LessThan(bound_arg(arg)),
            RuleName::LessThanEqual => Rule::LessThanEqual(bound_arg(arg)),
        };
        Ok(rule)
    }
}

impl TryFrom<&RuleSpec> for Rule {
    type Error = RuleParseError;

    fn try_from(spec: &RuleSpec) -> Result<Self, Self::Error> {
        spec.parse()
    }
}

/// Why a [`RuleSpec`] could not become a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("Unknown rule: {0}")]
    Unknown(String),

    #[error("Malformed rule {rule}: {reason}")]
    Malformed { rule: String, reason: String },
}

fn arg_text(arg: Option<&Value>) -> String {
    match arg {
        None | Some(Value::Null) => String::new(),
        Some(value) => value.to_text().into_owned(),
    }
}

fn list_arg(arg: Option<&Value>) -> ListArg {
    match arg {
        Some(Value::Array(items)) => {
            ListArg::Items(items.iter().map(|item| item.to_text().into_owned()).collect())
        }
        other => ListArg::Text(arg_text(other)),
    }
}

fn bound_arg(arg: Option<&Value>) -> Option<i64> {
    match arg {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => parse_int_prefix(s),
        _ => None,
    }
}

/// Parse the leading integer of `s`: `"10px"` is 10, `" -3.7"` is -3.
fn parse_int_prefix(s: &str) -> Option<i64> {
    let t = s.trim_start();
    let (sign, digits) = match t.as_bytes().first() {
        Some(b'-') => (-1, &t[1..]),
        Some(b'+') => (1, &t[1..]),
        _ => (1, t),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
