use std::borrow::Cow;
use std::fs;

use actix_multipart::form::tempfile::TempFile;
use validator::ValidationError;

use crate::domain::{
    Field, FieldValue, SelectedFile, StoredImageName, UploadRoot, UploadUrl,
};
use crate::services::form_state::UploadHooks;
use crate::services::submission::UploadState;
use crate::services::{ServiceError, ServiceResult};

pub const UPLOAD_FAILED: &str = "Falha no envio do arquivo";

/// Stores selected images and reports progress through the form hooks.
#[derive(Clone, Debug)]
pub struct UploadService {
    upload_root: UploadRoot,
    public_base_url: String,
}

impl UploadService {
    pub fn new(upload_root: UploadRoot, public_base_url: impl Into<String>) -> Self {
        Self {
            upload_root,
            public_base_url: public_base_url.into(),
        }
    }

    fn ensure_root(&self) -> ServiceResult<()> {
        fs::create_dir_all(self.upload_root.as_path()).map_err(ServiceError::StorageSetup)
    }

    fn selected_file(temp_file: &TempFile) -> SelectedFile {
        SelectedFile::new(
            temp_file.file_name.clone().unwrap_or_default(),
            temp_file
                .content_type
                .as_ref()
                .map(|mime| mime.essence_str().to_string()),
            temp_file.size,
        )
    }

    /// Select the file as the image value, validate it, store it, then set
    /// the preview and remote URLs. URLs of an earlier selection are cleared
    /// first; the preview is only available once the file is stored.
    pub fn accept(
        &self,
        temp_file: TempFile,
        upload: &mut UploadState,
        hooks: &mut dyn UploadHooks,
    ) -> ServiceResult<UploadUrl> {
        let selected = Self::selected_file(&temp_file);
        upload.reset();
        hooks.set_value(Field::Image, FieldValue::Files(vec![selected.clone()]));
        if !hooks.trigger(Field::Image) {
            return Err(ServiceError::InvalidImage);
        }

        let name = StoredImageName::generate(&selected.name);
        let stored = self.ensure_root().and_then(|()| {
            temp_file
                .file
                .persist(self.upload_root.resolve(&name))
                .map_err(|err| ServiceError::SaveFile(err.error))
        });
        if let Err(err) = stored {
            let mut error = ValidationError::new("upload");
            error.message = Some(Cow::Borrowed(UPLOAD_FAILED));
            hooks.set_error(Field::Image, error);
            return Err(err);
        }

        upload.set_preview_url(format!("/upload/{name}"));
        let url = UploadUrl::try_new(format!(
            "{}/upload/{name}",
            self.public_base_url.trim_end_matches('/')
        ))
        .map_err(|_| ServiceError::InvalidUrl)?;
        upload.set_remote_url(url.clone());

        log::info!("Stored image `{}` as {name}", selected.name);
        Ok(url)
    }
}
