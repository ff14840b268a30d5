//! Submission of the add-image form.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Field, FieldValue, ImageFormData, ImageSubmission, UploadUrl};
use crate::services::cache::IMAGES_TAG;
use crate::services::form_state::{FieldErrors, FormState};
use crate::services::ports::{
    ImagesApi, Modal, Notification, NotificationStatus, Notifier, QueryCache,
};

const NOTIFICATION_DURATION: Duration = Duration::from_millis(3000);

pub const IMAGE_CREATED: Notification = Notification {
    title: "Imagem cadastrada.",
    description: "Sua imagem foi cadastrada com sucesso.",
    status: NotificationStatus::Default,
    duration: None,
    dismissible: true,
};

pub const IMAGE_MISSING: Notification = Notification {
    title: "Imagem não adicionada.",
    description: "É preciso adicionar e aguardar o upload de uma imagem antes de realizar o cadastro.",
    status: NotificationStatus::Warning,
    duration: Some(NOTIFICATION_DURATION),
    dismissible: true,
};

pub const IMAGE_FAILED: Notification = Notification {
    title: "Falha no cadastro",
    description: "Ocorreu um erro ao tentar cadastrar a sua imagem.",
    status: NotificationStatus::Error,
    duration: Some(NOTIFICATION_DURATION),
    dismissible: true,
};

/// Component-local upload state: the remote URL and the preview path of the
/// stored file. Both are cleared whenever a new file is selected.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UploadState {
    remote_url: Option<UploadUrl>,
    preview_url: Option<String>,
}

impl UploadState {
    pub fn remote_url(&self) -> Option<&UploadUrl> {
        self.remote_url.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    pub fn set_remote_url(&mut self, url: UploadUrl) {
        self.remote_url = Some(url);
    }

    pub fn set_preview_url(&mut self, url: impl Into<String>) {
        self.preview_url = Some(url.into());
    }

    pub fn reset(&mut self) {
        self.remote_url = None;
        self.preview_url = None;
    }
}

/// How one submit attempt ended.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionOutcome {
    /// A field rule failed; nothing was reset.
    BlockedByValidation(FieldErrors),
    /// No finished upload; the API was not called.
    NoUpload,
    Created,
    Failed,
}

/// Runs a submit attempt against the injected collaborators.
pub struct SubmissionHandler<'a> {
    api: &'a dyn ImagesApi,
    cache: &'a dyn QueryCache,
    notifier: &'a dyn Notifier,
}

impl<'a> SubmissionHandler<'a> {
    pub fn new(
        api: &'a dyn ImagesApi,
        cache: &'a dyn QueryCache,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            api,
            cache,
            notifier,
        }
    }

    /// Validate every registered field, then submit when all pass.
    pub async fn handle_submit(
        &self,
        form: &mut dyn FormState,
        upload: &mut UploadState,
        modal: &mut dyn Modal,
    ) -> SubmissionOutcome {
        form.set_submitting(true);

        if !form.validate_all() {
            form.set_submitting(false);
            return SubmissionOutcome::BlockedByValidation(form.current_errors().clone());
        }

        let data = collect(form);
        let outcome = self.on_submit(data, form, upload, modal).await;
        form.set_submitting(false);
        outcome
    }

    /// Register the image when an upload finished. Local state is cleared
    /// and the modal closed whatever the result.
    pub async fn on_submit(
        &self,
        data: ImageFormData,
        form: &mut dyn FormState,
        upload: &mut UploadState,
        modal: &mut dyn Modal,
    ) -> SubmissionOutcome {
        let outcome = match upload.remote_url() {
            Some(url) => self.create(ImageSubmission::from_form(data, url)).await,
            None => {
                self.notifier.notify(IMAGE_MISSING);
                SubmissionOutcome::NoUpload
            }
        };

        cleanup(form, upload, modal);
        outcome
    }

    async fn create(&self, submission: ImageSubmission) -> SubmissionOutcome {
        match self.api.create(&submission).await {
            Ok(()) => {
                log::info!("Registered image `{}`", submission.title);
                self.cache.invalidate(IMAGES_TAG);
                self.notifier.notify(IMAGE_CREATED);
                SubmissionOutcome::Created
            }
            Err(err) => {
                log::error!("Failed to register image: {err}");
                self.notifier.notify(IMAGE_FAILED);
                SubmissionOutcome::Failed
            }
        }
    }
}

fn text_value(form: &dyn FormState, field: Field) -> String {
    form.value(field)
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
        .to_string()
}

fn collect(form: &dyn FormState) -> ImageFormData {
    ImageFormData {
        title: text_value(form, Field::Title),
        description: text_value(form, Field::Description),
    }
}

/// Reset fields, drop the image field, clear upload state and close the
/// modal. Safe to run repeatedly.
pub fn cleanup(form: &mut dyn FormState, upload: &mut UploadState, modal: &mut dyn Modal) {
    form.reset();
    form.unregister(Field::Image);
    upload.reset();
    modal.close();
}
