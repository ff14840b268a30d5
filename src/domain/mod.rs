//! Strongly-typed domain structures for the add-image form.
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Fields of the add-image form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Field {
    Image,
    Title,
    Description,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Image, Field::Title, Field::Description];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Image => "image",
            Field::Title => "title",
            Field::Description => "description",
        }
    }

    /// Value the field holds right after registration or reset.
    pub fn empty_value(&self) -> FieldValue {
        match self {
            Field::Image => FieldValue::Files(Vec::new()),
            Field::Title | Field::Description => FieldValue::Text(String::new()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of a file picked by the user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            content_type,
            size,
        }
    }

    /// MIME type when known, file name otherwise.
    pub fn format_hint(&self) -> &str {
        self.content_type.as_deref().unwrap_or(&self.name)
    }
}

/// Current value of a registered field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Files(Vec<SelectedFile>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Files(files) => files.is_empty(),
        }
    }

    /// Length in characters for text, number of files otherwise.
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Text(text) => text.chars().count(),
            FieldValue::Files(files) => files.len(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Files(_) => None,
        }
    }

    pub fn first_file(&self) -> Option<&SelectedFile> {
        match self {
            FieldValue::Files(files) => files.first(),
            FieldValue::Text(_) => None,
        }
    }
}

/// Data collected from the form on submit, before the upload URL is merged.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImageFormData {
    pub title: String,
    pub description: String,
}

/// Payload registered with the images API.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImageSubmission {
    pub title: String,
    pub description: String,
    pub url: String,
}

impl ImageSubmission {
    pub fn from_form(data: ImageFormData, url: &UploadUrl) -> Self {
        Self {
            title: data.title,
            description: data.description,
            url: url.as_str().to_string(),
        }
    }
}

/// Remote location of an uploaded image.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UploadUrl(String);

impl UploadUrl {
    pub fn try_new(value: String) -> Result<Self, TypeConstraintError> {
        if value.trim().is_empty() {
            return Err(TypeConstraintError::EmptyUrl);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Image stored in the remote collection.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub url: String,
}

/// One page of the remote image collection.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImagePage {
    pub data: Vec<ImageRecord>,
    #[serde(default)]
    pub after: Option<String>,
}

/// Directory receiving uploaded images (e.g. `./upload`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadRoot(PathBuf);

impl UploadRoot {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn resolve(&self, name: &StoredImageName) -> PathBuf {
        self.0.join(name.as_str())
    }
}

impl From<PathBuf> for UploadRoot {
    fn from(value: PathBuf) -> Self {
        Self::new(value)
    }
}

/// Generated single-component name of a stored image.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StoredImageName(String);

impl StoredImageName {
    /// Build a fresh name keeping the lowercased extension of the original.
    pub fn generate(original: &str) -> Self {
        let extension = Path::new(original)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase());

        match extension {
            Some(ext) => Self(format!("{}.{ext}", Uuid::new_v4())),
            None => Self(Uuid::new_v4().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Error)]
pub enum TypeConstraintError {
    #[error("upload url must not be empty")]
    EmptyUrl,
}
