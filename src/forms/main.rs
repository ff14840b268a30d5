use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use serde::Deserialize;

use crate::domain::{Field, FieldValue};

/// File selection posted by the picker. The size cap sits above the
/// validation limit so oversized files still reach the rule set.
#[derive(MultipartForm)]
pub struct UploadImageForm {
    #[multipart(limit = "25MB")]
    pub image: TempFile,
}

/// Text fields posted when the add-image form is submitted.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AddImageForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl AddImageForm {
    pub fn values(&self) -> [(Field, FieldValue); 2] {
        [
            (Field::Title, FieldValue::Text(self.title.clone())),
            (Field::Description, FieldValue::Text(self.description.clone())),
        ]
    }
}
