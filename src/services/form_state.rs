//! Form state: registered fields, their values and current errors.
use std::collections::BTreeMap;

use validator::{ValidationError, ValidationErrors};

use crate::domain::{Field, FieldValue};
use crate::forms::image::rules_for;
use crate::forms::rules::{FieldRules, Rule};

/// Current error per field. At most one error is kept for each field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<Field, ValidationError>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&ValidationError> {
        self.0.get(&field)
    }

    /// User-facing message of the field's error.
    pub fn message(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(|error| error.message.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &ValidationError)> {
        self.0.iter().map(|(field, error)| (*field, error))
    }

    fn insert(&mut self, field: Field, error: ValidationError) {
        self.0.insert(field, error);
    }

    fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    pub fn to_validation_errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for (field, error) in self.iter() {
            errors.add(field.as_str(), error.clone());
        }
        errors
    }
}

/// Capabilities of a form-state provider used by the submission workflow.
pub trait FormState {
    /// Attach rules to a field. Replaces earlier rules and keeps the value.
    fn register(&mut self, field: Field, rules: &FieldRules);

    fn current_errors(&self) -> &FieldErrors;

    /// Restore every registered field to its empty value and drop errors.
    fn reset(&mut self);

    /// Forget a field together with its value, rules and error.
    fn unregister(&mut self, field: Field);

    /// Run the rules of every registered field. `true` when all pass.
    fn validate_all(&mut self) -> bool;

    fn value(&self, field: Field) -> Option<&FieldValue>;

    fn is_submitting(&self) -> bool;

    fn set_submitting(&mut self, submitting: bool);
}

/// Hooks handed to the upload collaborator.
pub trait UploadHooks {
    fn set_value(&mut self, field: Field, value: FieldValue);

    fn set_error(&mut self, field: Field, error: ValidationError);

    /// Validate a single field. `true` when it passes.
    fn trigger(&mut self, field: Field) -> bool;
}

#[derive(Clone, Debug)]
struct RegisteredField {
    rules: Vec<Rule>,
    value: FieldValue,
}

impl RegisteredField {
    fn evaluate(&self) -> Result<(), ValidationError> {
        self.rules
            .iter()
            .try_for_each(|rule| rule.evaluate(&self.value))
    }
}

#[derive(Clone, Debug, Default)]
pub struct FormController {
    fields: BTreeMap<Field, RegisteredField>,
    errors: FieldErrors,
    submitting: bool,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller with the image, title and description fields registered.
    pub fn for_add_image() -> Self {
        let mut controller = Self::new();
        for field in Field::ALL {
            controller.register(field, &rules_for(field));
        }
        controller
    }

    pub fn is_registered(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    fn compile(field: Field, rules: &FieldRules) -> Vec<Rule> {
        rules
            .entries()
            .iter()
            .filter_map(|(key, option)| match Rule::compile(key, option) {
                Ok(rule) => Some(rule),
                Err(err) => {
                    log::warn!("Skipping rule on field `{field}`: {err}");
                    None
                }
            })
            .collect()
    }

    fn validate_field(&mut self, field: Field) -> bool {
        let outcome = match self.fields.get(&field) {
            Some(registered) => registered.evaluate(),
            None => Ok(()),
        };

        match outcome {
            Ok(()) => {
                self.errors.remove(field);
                true
            }
            Err(error) => {
                self.errors.insert(field, error);
                false
            }
        }
    }
}

impl FormState for FormController {
    fn register(&mut self, field: Field, rules: &FieldRules) {
        let rules = Self::compile(field, rules);
        self.fields
            .entry(field)
            .and_modify(|registered| registered.rules = rules.clone())
            .or_insert_with(|| RegisteredField {
                rules,
                value: field.empty_value(),
            });
    }

    fn current_errors(&self) -> &FieldErrors {
        &self.errors
    }

    fn reset(&mut self) {
        for (field, registered) in self.fields.iter_mut() {
            registered.value = field.empty_value();
        }
        self.errors.clear();
        self.submitting = false;
    }

    fn unregister(&mut self, field: Field) {
        self.fields.remove(&field);
        self.errors.remove(field);
    }

    fn validate_all(&mut self) -> bool {
        let fields: Vec<Field> = self.fields.keys().copied().collect();
        fields
            .into_iter()
            .fold(true, |valid, field| self.validate_field(field) && valid)
    }

    fn value(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field).map(|registered| &registered.value)
    }

    fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }
}

impl UploadHooks for FormController {
    fn set_value(&mut self, field: Field, value: FieldValue) {
        match self.fields.get_mut(&field) {
            Some(registered) => registered.value = value,
            None => log::debug!("Ignoring value for unregistered field `{field}`"),
        }
    }

    fn set_error(&mut self, field: Field, error: ValidationError) {
        self.errors.insert(field, error);
    }

    fn trigger(&mut self, field: Field) -> bool {
        self.validate_field(field)
    }
}
