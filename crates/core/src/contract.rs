//! Declarative call contracts.
//!
//! A [`CallContract`] bundles a signature with per-parameter checks so a
//! whole argument list can be validated at once. Contracts are plain serde
//! data and can be loaded from JSON config:
//!
//! ```json
//! {
//!   "signature": { "name": "create_user", "params": ["name", "age"] },
//!   "params": [
//!     { "position": 1, "types": "string", "rules": ["NOT-STRING-EMPTY"] },
//!     { "position": 2, "types": "number", "rules": [{ "GREATER-THAN": 0 }] }
//!   ]
//! }
//! ```

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DuctTapeError;
use crate::signature::Signature;
use crate::types::{ExpectedTypes, Inspect, TypeTag};
use crate::validation::evaluator::validate_expected;
use crate::validation::rules::{Rule, RuleParseError, RuleSpec};

/// Expected types and rules for one parameter.
///
/// Rules are parsed on the first [`check`](Self::check) and reused after
/// that, so a REGEX pattern is compiled once per check rather than once per
/// value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamCheck {
    /// 1-based parameter position.
    pub position: usize,
    pub types: ExpectedTypes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rules: Vec<RuleSpec>,
    #[serde(skip)]
    parsed: OnceLock<Vec<Result<Rule, RuleParseError>>>,
}

impl ParamCheck {
    pub fn new(position: usize, types: impl Into<ExpectedTypes>) -> Self {
        Self {
            position,
            types: types.into(),
            rules: Vec::new(),
            parsed: OnceLock::new(),
        }
    }

    pub fn rule(mut self, rule: impl Into<RuleSpec>) -> Self {
        self.rules.push(rule.into());
        self.parsed = OnceLock::new();
        self
    }

    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    /// Validate `value` as this parameter of `signature`.
    ///
    /// A rule that failed to parse is kept as its error and reported each
    /// time evaluation reaches it.
    pub fn check<V>(&self, signature: &Signature, value: &V) -> Result<TypeTag, DuctTapeError>
    where
        V: Inspect + ?Sized,
    {
        let parsed = self.parsed_rules();
        validate_expected(
            signature,
            self.position,
            value,
            &self.types,
            parsed.iter().map(|rule| rule.as_ref().map_err(Clone::clone)),
        )
    }

    fn parsed_rules(&self) -> &[Result<Rule, RuleParseError>] {
        self.parsed
            .get_or_init(|| self.rules.iter().map(RuleSpec::parse).collect())
    }
}

impl PartialEq for ParamCheck {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.types == other.types && self.rules == other.rules
    }
}

/// A signature plus the checks for its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallContract {
    pub signature: Signature,
    #[serde(default)]
    pub params: Vec<ParamCheck>,
}

impl CallContract {
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, check: ParamCheck) -> Self {
        self.params.push(check);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate positional `args` against every parameter check, in the
    /// order the checks are declared.
    ///
    /// A check whose position is past the end of `args` sees an undefined
    /// value. Returns the confirmed type of each checked parameter.
    pub fn check(&self, args: &[Value]) -> Result<Vec<TypeTag>, DuctTapeError> {
        tracing::trace!(
            callable = %self.signature.name,
            checks = self.params.len(),
            args = args.len(),
            "Checking call contract"
        );

        self.params
            .iter()
            .map(|param| {
                let arg = param
                    .position
                    .checked_sub(1)
                    .and_then(|i| args.get(i));
                param.check(&self.signature, &arg)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::validation::rules::RuleName;
    use assert_matches::assert_matches;
    use serde_json::json;

    const CONTRACT: &str = r#"{
        "signature": { "name": "create_user", "params": ["name", "age", "role"] },
        "params": [
            { "position": 1, "types": "string", "rules": ["NOT-STRING-EMPTY", "ALPHA"] },
            { "position": 2, "types": ["number", "null"], "rules": [{ "GREATER-THAN": 0 }] },
            { "position": 3, "types": ["string", "undefined"], "rules": [{ "NOT_IN_LIST": ["root"] }] }
        ]
    }"#;

    #[test]
    fn loads_from_json() {
        let contract = CallContract::from_json(CONTRACT).unwrap();
        assert_eq!(contract.signature.params.len(), 3);
        assert_eq!(contract.params[1].types.as_slice(), &[TypeTag::Number, TypeTag::Null]);
        assert_eq!(contract.params[2].rules().len(), 1);
    }

    #[test]
    fn passes_valid_arguments() {
        let contract = CallContract::from_json(CONTRACT).unwrap();
        let tags = contract.check(&[json!("alice"), json!(30), json!("admin")]).unwrap();
        assert_eq!(tags, vec![TypeTag::String, TypeTag::Number, TypeTag::String]);
    }

    #[test]
    fn missing_argument_is_undefined() {
        let contract = CallContract::from_json(CONTRACT).unwrap();
        let err = contract.check(&[json!("alice")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.context().position, 2);
        assert_eq!(err.context().actual, TypeTag::Undefined);

        let tags = contract.check(&[json!("alice"), json!(null)]).unwrap();
        assert_eq!(tags, vec![TypeTag::String, TypeTag::Null, TypeTag::Undefined]);
    }

    #[test]
    fn reports_first_failing_parameter() {
        let contract = CallContract::from_json(CONTRACT).unwrap();
        let err = contract
            .check(&[json!("alice"), json!(-1), json!("root")])
            .unwrap_err();
        assert_eq!(err.context().position, 2);
        assert_eq!(err.rule_name(), Some(RuleName::GreaterThan));
        assert!(err
            .to_string()
            .contains("create_user( name, age: <number|null>, role )"));
    }

    #[test]
    fn builder_matches_json_form() {
        let built = CallContract::new(Signature::new("set_port", ["port"])).param(
            ParamCheck::new(1, TypeTag::Number)
                .rule(("GREATER-THAN", 1))
                .rule(("LESS-THAN", 65535)),
        );
        let loaded = CallContract::from_json(
            r#"{
                "signature": { "name": "set_port", "params": ["port"] },
                "params": [{ "position": 1, "types": "number",
                             "rules": [{ "GREATER-THAN": 1 }, { "LESS-THAN": 65535 }] }]
            }"#,
        )
        .unwrap();
        assert_eq!(built, loaded);
        assert_matches!(built.check(&[json!(70000)]), Err(DuctTapeError::RuleViolation { .. }));
    }

    #[test]
    fn param_check_accepts_native_values() {
        let sig = Signature::new("greet", ["name"]);
        let check = ParamCheck::new(1, TypeTag::String).rule("NOT-STRING-EMPTY");
        assert_eq!(check.check(&sig, "bob").unwrap(), TypeTag::String);
        assert!(check.check(&sig, " ").is_err());
    }

    #[test]
    fn parses_rules_once_per_check() {
        let contract = CallContract::from_json(CONTRACT).unwrap();
        let param = &contract.params[0];
        assert!(param.parsed.get().is_none());

        contract.check(&[json!("alice"), json!(1), json!("admin")]).unwrap();
        let first = param.parsed_rules().as_ptr();
        assert_eq!(param.parsed_rules().len(), 2);

        let err = contract.check(&[json!("al1ce")]).unwrap_err();
        assert_eq!(err.rule_name(), Some(RuleName::Alpha));
        assert_eq!(param.parsed_rules().as_ptr(), first);
    }

    #[test]
    fn cached_malformed_rule_is_reported_on_every_check() {
        let sig = Signature::new("grep", ["pattern"]);
        let check = ParamCheck::new(1, TypeTag::String).rule(("REGEX", "("));
        for _ in 0..2 {
            let err = check.check(&sig, "x").unwrap_err();
            assert_matches!(err, DuctTapeError::MalformedRule { ref rule, .. } if rule == "REGEX");
        }
    }

    #[test]
    fn adding_a_rule_resets_the_cache() {
        let sig = Signature::new("greet", ["name"]);
        let check = ParamCheck::new(1, TypeTag::String).rule("NOT-STRING-EMPTY");
        assert!(check.check(&sig, "bob1").is_ok());

        let check = check.rule("ALPHA");
        let err = check.check(&sig, "bob1").unwrap_err();
        assert_eq!(err.rule_name(), Some(RuleName::Alpha));
    }
}
