//! Validation rules of the add-image form.
use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::{Field, FieldValue};
use crate::forms::rules::{
    FieldRules, MAX_LENGTH, NamedCheck, REQUIRED, RuleOption, VALIDATE,
};

/// Files must be strictly smaller than this many bytes.
pub const MAX_IMAGE_SIZE: usize = 10_000_000;

pub const IMAGE_TOO_LARGE: &str = "O arquivo deve ser menor que 10MB";

/// Key the title minimum is declared under. It does not match [`MIN_LENGTH`],
/// so the controller skips it and short titles are accepted.
///
/// [`MIN_LENGTH`]: crate::forms::rules::MIN_LENGTH
pub const TITLE_MIN_LENGTH_KEY: &str = "minLenght";

lazy_static! {
    static ref IMAGE_FORMAT: Regex = Regex::new(r"(?i)[/.](gif|jpg|jpeg|png)$")
        .expect("image format pattern is valid");
}

fn less_than_ten(value: &FieldValue) -> bool {
    value
        .first_file()
        .is_some_and(|file| file.size < MAX_IMAGE_SIZE)
}

fn valid_format(value: &FieldValue) -> bool {
    value
        .first_file()
        .is_some_and(|file| IMAGE_FORMAT.is_match(file.format_hint()))
}

pub fn image_rules() -> FieldRules {
    FieldRules::new()
        .rule(REQUIRED, RuleOption::Message("Arquivo obrigatório"))
        .rule(
            VALIDATE,
            RuleOption::Checks(vec![
                NamedCheck {
                    name: "lessThenTen",
                    check: less_than_ten,
                    message: IMAGE_TOO_LARGE,
                },
                NamedCheck {
                    name: "validFormat",
                    check: valid_format,
                    message: "Somente são aceitos arquivos PNG, JPEG e GIF",
                },
            ]),
        )
}

pub fn title_rules() -> FieldRules {
    FieldRules::new()
        .rule(REQUIRED, RuleOption::Message("Título obrigatório"))
        .rule(
            TITLE_MIN_LENGTH_KEY,
            RuleOption::Limit {
                value: 2,
                message: "Mínimo de 2 caracteres",
            },
        )
        .rule(
            MAX_LENGTH,
            RuleOption::Limit {
                value: 20,
                message: "Máximo de 20 caracteres",
            },
        )
}

pub fn description_rules() -> FieldRules {
    FieldRules::new()
        .rule(REQUIRED, RuleOption::Message("Descrição obrigatória"))
        .rule(
            MAX_LENGTH,
            RuleOption::Limit {
                value: 65,
                message: "Máximo de 65 caracteres",
            },
        )
}

/// Rules for every field of the form.
pub fn rules_for(field: Field) -> FieldRules {
    match field {
        Field::Image => image_rules(),
        Field::Title => title_rules(),
        Field::Description => description_rules(),
    }
}
