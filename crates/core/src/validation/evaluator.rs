//! Rule evaluator — pure logic, no I/O.
//!
//! Checks the value's type first, then each rule in order. The first
//! failure ends evaluation; later rules are never parsed or run.

use std::borrow::Borrow;
use std::sync::LazyLock;

use regex::Regex;

use super::rules::{Rule, RuleParseError, RuleSpec};
use crate::error::{DuctTapeError, ParamContext};
use crate::signature::Signature;
use crate::types::{number_text, ExpectedTypes, Inspect, TypeTag};

static ALPHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").expect("valid regex"));

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]*)?$").expect("valid regex")
});

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

static ALPHANUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("valid regex"));

/// Validate one parameter of `signature`.
///
/// Returns the value's confirmed [`TypeTag`] when its type is in `expected`
/// and every rule passes.
///
/// # Errors
///
/// - [`DuctTapeError::TypeMismatch`] when the type is not expected. Rules
///   are not looked at.
/// - [`DuctTapeError::RuleViolation`] for the first rule the value fails.
/// - [`DuctTapeError::UnknownRule`] / [`DuctTapeError::MalformedRule`] when
///   a rule reached during evaluation cannot be resolved.
///
/// # Examples
///
/// ```
/// use ducttape_core::{validate, RuleSpec, Signature, TypeTag};
///
/// let sig = Signature::new("create_user", ["name", "age"]);
/// let rules = [RuleSpec::from("NOT-STRING-EMPTY")];
///
/// let tag = validate(&sig, 1, "alice", TypeTag::String, &rules).unwrap();
/// assert_eq!(tag, TypeTag::String);
///
/// let err = validate(&sig, 1, "  ", TypeTag::String, &rules).unwrap_err();
/// assert_eq!(err.name(), "RuleViolation");
/// ```
pub fn validate<V>(
    signature: &Signature,
    position: usize,
    value: &V,
    expected: impl Into<ExpectedTypes>,
    rules: &[RuleSpec],
) -> Result<TypeTag, DuctTapeError>
where
    V: Inspect + ?Sized,
{
    validate_expected(
        signature,
        position,
        value,
        &expected.into(),
        rules.iter().map(RuleSpec::parse),
    )
}

/// [`validate`] with rules that are already parsed.
///
/// Use this when the same rules check many values, so patterns are compiled
/// once. Unknown and malformed rules were rejected while parsing, so only
/// [`DuctTapeError::TypeMismatch`] and [`DuctTapeError::RuleViolation`] are
/// returned.
pub fn validate_rules<V>(
    signature: &Signature,
    position: usize,
    value: &V,
    expected: impl Into<ExpectedTypes>,
    rules: &[Rule],
) -> Result<TypeTag, DuctTapeError>
where
    V: Inspect + ?Sized,
{
    validate_expected(
        signature,
        position,
        value,
        &expected.into(),
        rules.iter().map(Ok::<_, RuleParseError>),
    )
}

/// [`validate`] with no rules: a type check only.
pub fn validate_type<V>(
    signature: &Signature,
    position: usize,
    value: &V,
    expected: impl Into<ExpectedTypes>,
) -> Result<TypeTag, DuctTapeError>
where
    V: Inspect + ?Sized,
{
    validate_rules(signature, position, value, expected, &[])
}

/// Shared loop behind every entry point. `rules` is consumed lazily, so a
/// rule after the first failure is never parsed.
pub(crate) fn validate_expected<V, I, R>(
    signature: &Signature,
    position: usize,
    value: &V,
    expected: &ExpectedTypes,
    rules: I,
) -> Result<TypeTag, DuctTapeError>
where
    V: Inspect + ?Sized,
    I: IntoIterator<Item = Result<R, RuleParseError>>,
    R: Borrow<Rule>,
{
    let actual = value.type_tag();
    let context = || {
        Box::new(ParamContext {
            signature: signature.clone(),
            position,
            value: value.to_text().into_owned(),
            expected: expected.clone(),
            actual,
        })
    };

    if !expected.contains(actual) {
        tracing::debug!(
            position,
            actual = %actual,
            expected = %expected,
            "Parameter type mismatch"
        );
        return Err(DuctTapeError::TypeMismatch(context()));
    }

    for parsed in rules {
        let rule = match parsed {
            Ok(rule) => rule,
            Err(RuleParseError::Unknown(rule)) => {
                tracing::warn!(position, rule = %rule, "Unknown validation rule");
                return Err(DuctTapeError::UnknownRule {
                    context: context(),
                    rule,
                });
            }
            Err(RuleParseError::Malformed { rule, reason }) => {
                tracing::warn!(position, rule = %rule, reason = %reason, "Malformed validation rule");
                return Err(DuctTapeError::MalformedRule {
                    context: context(),
                    rule,
                    reason,
                });
            }
        };

        let rule = <R as Borrow<Rule>>::borrow(&rule);
        tracing::trace!(position, rule = %rule.name(), "Evaluating rule");
        if let Some(detail) = evaluate_rule(rule, value) {
            tracing::debug!(position, rule = %rule.name(), "Rule violated");
            return Err(DuctTapeError::RuleViolation {
                context: context(),
                rule: rule.name(),
                detail,
            });
        }
    }

    Ok(actual)
}

/// Run one predicate. Returns the failure detail, or `None` on a pass.
fn evaluate_rule<V: Inspect + ?Sized>(rule: &Rule, value: &V) -> Option<String> {
    match rule {
        Rule::Regex(re) => {
            let text = value.to_text();
            re.is_match(&text)
                .then(|| format!("Value must not match regex ({})!", re.as_str()))
        }
        Rule::Alpha => evaluate_pattern(&ALPHA_RE, value, "Must be alpha characters (a-zA-Z)!"),
        Rule::Number => evaluate_pattern(&NUMBER_RE, value, "Must be a valid number!"),
        Rule::Numeric => evaluate_pattern(&NUMERIC_RE, value, "Must be numeric characters (0-9)!"),
        Rule::AlphaNumeric => evaluate_pattern(
            &ALPHANUMERIC_RE,
            value,
            "Must be alpha numeric characters (a-zA-Z0-9)!",
        ),
        Rule::NotStringEmpty => value
            .to_text()
            .trim()
            .is_empty()
            .then(|| "Cannot be string empty!".to_string()),
        Rule::InList(list) => {
            (!list.contains(&value.to_text())).then(|| format!("Must be in allowed list ({list})!"))
        }
        Rule::NotInList(list) => {
            list.contains(&value.to_text()).then(|| format!("Must not be in list ({list})!"))
        }
        // The strict and non-strict spellings share one inclusive comparison.
        // A missing bound is NaN, which no value satisfies.
        Rule::GreaterThan(bound) | Rule::GreaterThanEqual(bound) => {
            let limit = bound_limit(*bound);
            let passes = value.to_number() >= limit;
            (!passes).then(|| {
                let relation = match rule {
                    Rule::GreaterThan(_) => "greater than",
                    _ => "greater than or equal to",
                };
                format!("{} must be {relation} {}!", value.to_text(), number_text(limit))
            })
        }
        Rule::LessThan(bound) | Rule::LessThanEqual(bound) => {
            let limit = bound_limit(*bound);
            let passes = value.to_number() <= limit;
            (!passes).then(|| {
                let relation = match rule {
                    Rule::LessThan(_) => "less than",
                    _ => "less than or equal to",
                };
                format!("{} must be {relation} {}!", value.to_text(), number_text(limit))
            })
        }
    }
}

fn bound_limit(bound: Option<i64>) -> f64 {
    bound.map_or(f64::NAN, |b| b as f64)
}

fn evaluate_pattern<V: Inspect + ?Sized>(re: &Regex, value: &V, detail: &str) -> Option<String> {
    (!re.is_match(&value.to_text())).then(|| detail.to_string())
}
