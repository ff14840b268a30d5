//! Declarative per-field validation rules.
//!
//! Rules are declared as `(key, option)` pairs in the order they should run
//! and compiled by the form controller at registration. Keys the controller
//! does not know are rejected at compile time and never evaluated.
use std::borrow::Cow;

use thiserror::Error;
use validator::ValidationError;

use crate::domain::FieldValue;

pub const REQUIRED: &str = "required";
pub const MIN_LENGTH: &str = "minLength";
pub const MAX_LENGTH: &str = "maxLength";
pub const VALIDATE: &str = "validate";

/// Named predicate with the message shown when it fails.
#[derive(Clone, Copy, Debug)]
pub struct NamedCheck {
    pub name: &'static str,
    pub check: fn(&FieldValue) -> bool,
    pub message: &'static str,
}

/// Value attached to a rule key.
#[derive(Clone, Debug)]
pub enum RuleOption {
    Message(&'static str),
    Limit { value: usize, message: &'static str },
    Checks(Vec<NamedCheck>),
}

/// Ordered rule declarations for one field.
#[derive(Clone, Debug, Default)]
pub struct FieldRules {
    entries: Vec<(&'static str, RuleOption)>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, key: &'static str, option: RuleOption) -> Self {
        self.entries.push((key, option));
        self
    }

    pub fn entries(&self) -> &[(&'static str, RuleOption)] {
        &self.entries
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("unknown rule key `{0}`")]
    UnknownKey(&'static str),
    #[error("rule `{0}` does not accept this option")]
    MismatchedOption(&'static str),
}

/// Executable rule produced from a declaration.
#[derive(Clone, Debug)]
pub enum Rule {
    Required(&'static str),
    MinLength(usize, &'static str),
    MaxLength(usize, &'static str),
    Checks(Vec<NamedCheck>),
}

impl Rule {
    pub fn compile(key: &'static str, option: &RuleOption) -> Result<Rule, RuleError> {
        match (key, option) {
            (REQUIRED, RuleOption::Message(message)) => Ok(Rule::Required(*message)),
            (MIN_LENGTH, RuleOption::Limit { value, message }) => {
                Ok(Rule::MinLength(*value, *message))
            }
            (MAX_LENGTH, RuleOption::Limit { value, message }) => {
                Ok(Rule::MaxLength(*value, *message))
            }
            (VALIDATE, RuleOption::Checks(checks)) => Ok(Rule::Checks(checks.clone())),
            (REQUIRED | MIN_LENGTH | MAX_LENGTH | VALIDATE, _) => {
                Err(RuleError::MismatchedOption(key))
            }
            _ => Err(RuleError::UnknownKey(key)),
        }
    }

    /// Evaluate against the current value; `Err` carries the failing rule.
    pub fn evaluate(&self, value: &FieldValue) -> Result<(), ValidationError> {
        match self {
            Rule::Required(message) if value.is_empty() => Err(failure(REQUIRED, *message)),
            Rule::Required(_) => Ok(()),
            // Length limits only apply to non-empty values.
            Rule::MinLength(min, message) if !value.is_empty() && value.len() < *min => {
                Err(failure(MIN_LENGTH, *message))
            }
            Rule::MaxLength(max, message) if value.len() > *max => {
                Err(failure(MAX_LENGTH, *message))
            }
            Rule::MinLength(..) | Rule::MaxLength(..) => Ok(()),
            Rule::Checks(checks) => checks
                .iter()
                .find(|named| !(named.check)(value))
                .map_or(Ok(()), |named| Err(failure(named.name, named.message))),
        }
    }
}

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_string())
    }

    #[test]
    fn compile_rejects_unknown_keys() {
        let option = RuleOption::Limit {
            value: 2,
            message: "too short",
        };
        assert_eq!(
            Rule::compile("minLenght", &option).unwrap_err(),
            RuleError::UnknownKey("minLenght")
        );
        assert!(Rule::compile(MIN_LENGTH, &option).is_ok());
    }

    #[test]
    fn compile_rejects_mismatched_options() {
        let err = Rule::compile(REQUIRED, &RuleOption::Checks(vec![])).unwrap_err();
        assert_eq!(err, RuleError::MismatchedOption(REQUIRED));
    }

    #[test]
    fn required_fails_on_empty_values() {
        let rule = Rule::Required("needed");
        let err = rule.evaluate(&text("")).unwrap_err();

        assert_eq!(err.code, REQUIRED);
        assert_eq!(err.message.as_deref(), Some("needed"));
        assert!(rule.evaluate(&text(" ")).is_ok());
        assert!(rule.evaluate(&FieldValue::Files(vec![])).is_err());
    }

    #[test]
    fn length_limits_are_inclusive() {
        let max = Rule::MaxLength(3, "long");
        let min = Rule::MinLength(2, "short");

        assert!(max.evaluate(&text("abc")).is_ok());
        assert!(max.evaluate(&text("abcd")).is_err());
        assert!(min.evaluate(&text("ab")).is_ok());
        assert!(min.evaluate(&text("a")).is_err());
    }

    #[test]
    fn checks_report_first_failing_name() {
        let rule = Rule::Checks(vec![
            NamedCheck {
                name: "alwaysOk",
                check: |_| true,
                message: "never",
            },
            NamedCheck {
                name: "neverOk",
                check: |_| false,
                message: "always",
            },
        ]);

        let err = rule.evaluate(&text("x")).unwrap_err();
        assert_eq!(err.code, "neverOk");
    }
}
