//! Error types for argument validation.
//!
//! Every variant carries a [`ParamContext`] so the diagnostic (ordinal
//! position plus annotated call signature) can be rendered. Rendering is
//! deferred to `Display`; building an error does no string formatting
//! beyond capturing the offending value's text.

use std::fmt;

use crate::ordinal::ordinal_word;
use crate::signature::{describe_call, Signature};
use crate::types::{ExpectedTypes, TypeTag};
use crate::validation::rules::RuleName;

/// The parameter a validation failure is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamContext {
    pub signature: Signature,
    /// 1-based parameter position.
    pub position: usize,
    /// Text form of the offending value.
    pub value: String,
    pub expected: ExpectedTypes,
    pub actual: TypeTag,
}

impl ParamContext {
    /// `"first"`, `"twenty-second"`, ... Positions beyond the ordinal table
    /// fall back to `#<n>`.
    pub fn position_word(&self) -> String {
        i64::try_from(self.position)
            .ok()
            .and_then(|n| ordinal_word(n).ok())
            .unwrap_or_else(|| format!("#{}", self.position))
    }

    pub fn annotated_signature(&self) -> String {
        describe_call(&self.signature, self.position, &self.expected)
    }
}

/// Discriminator for [`DuctTapeError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    RuleViolation,
    UnknownRule,
    MalformedRule,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::RuleViolation => "RuleViolation",
            ErrorKind::UnknownRule => "UnknownRule",
            ErrorKind::MalformedRule => "MalformedRule",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DuctTapeError {
    /// The value's runtime type is not in the expected set.
    #[error(
        "Incorrect {} parameter type ({})! in \n{}",
        .0.position_word(),
        .0.actual,
        .0.annotated_signature()
    )]
    TypeMismatch(Box<ParamContext>),

    /// The value has an expected type but fails a rule.
    #[error(
        "Incorrect {} parameter value (Rule: {rule})! in \n{}\n{detail}",
        .context.position_word(),
        .context.annotated_signature()
    )]
    RuleViolation {
        context: Box<ParamContext>,
        rule: RuleName,
        detail: String,
    },

    /// The calling code named a rule that does not exist.
    #[error(
        "No validation rule found for {} parameter (Missing Rule: {rule})! in \n{}",
        .context.position_word(),
        .context.annotated_signature()
    )]
    UnknownRule {
        context: Box<ParamContext>,
        rule: String,
    },

    /// The calling code gave a rule an argument it cannot use.
    #[error(
        "Malformed rule for {} parameter (Rule: {rule})! {reason} in \n{}",
        .context.position_word(),
        .context.annotated_signature()
    )]
    MalformedRule {
        context: Box<ParamContext>,
        rule: String,
        reason: String,
    },
}

impl DuctTapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DuctTapeError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            DuctTapeError::RuleViolation { .. } => ErrorKind::RuleViolation,
            DuctTapeError::UnknownRule { .. } => ErrorKind::UnknownRule,
            DuctTapeError::MalformedRule { .. } => ErrorKind::MalformedRule,
        }
    }

    /// Shortcut for `self.kind().as_str()`.
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn context(&self) -> &ParamContext {
        match self {
            DuctTapeError::TypeMismatch(context)
            | DuctTapeError::RuleViolation { context, .. }
            | DuctTapeError::UnknownRule { context, .. }
            | DuctTapeError::MalformedRule { context, .. } => context,
        }
    }

    /// The rule that failed, for rule violations.
    pub fn rule_name(&self) -> Option<RuleName> {
        match self {
            DuctTapeError::RuleViolation { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    /// True when the failure is a defect in the calling code rather than
    /// bad data.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            DuctTapeError::UnknownRule { .. } | DuctTapeError::MalformedRule { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(position: usize) -> Box<ParamContext> {
        Box::new(ParamContext {
            signature: Signature::new("create_user", ["name", "age"]),
            position,
            value: "42".to_string(),
            expected: ExpectedTypes::from(TypeTag::String),
            actual: TypeTag::Number,
        })
    }

    #[test]
    fn type_mismatch_message() {
        let err = DuctTapeError::TypeMismatch(context(1));
        assert_eq!(
            err.to_string(),
            "Incorrect first parameter type (number)! in \ncreate_user( name: <string>, age )"
        );
        assert_eq!(err.name(), "TypeMismatch");
        assert_eq!(err.rule_name(), None);
    }

    #[test]
    fn rule_violation_message_and_rule() {
        let err = DuctTapeError::RuleViolation {
            context: context(2),
            rule: RuleName::Alpha,
            detail: "Must be alpha characters (a-zA-Z)!".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Incorrect second parameter value (Rule: ALPHA)! in \n\
             create_user( name, age: <string> )\n\
             Must be alpha characters (a-zA-Z)!"
        );
        assert_eq!(err.kind(), ErrorKind::RuleViolation);
        assert_eq!(err.rule_name(), Some(RuleName::Alpha));
        assert!(!err.is_programmer_error());
    }

    #[test]
    fn unknown_rule_is_programmer_error() {
        let err = DuctTapeError::UnknownRule {
            context: context(1),
            rule: "BOGUS".to_string(),
        };
        assert!(err.is_programmer_error());
        assert!(err.to_string().starts_with(
            "No validation rule found for first parameter (Missing Rule: BOGUS)!"
        ));
    }

    #[test]
    fn position_word_falls_back_past_table() {
        assert_eq!(context(21).position_word(), "twenty-first");
        assert_eq!(context(120).position_word(), "#120");
    }

    #[test]
    fn unaddressable_position_renders_empty_signature() {
        let err = DuctTapeError::TypeMismatch(context(5));
        assert_eq!(err.to_string(), "Incorrect fifth parameter type (number)! in \n");
    }
}
