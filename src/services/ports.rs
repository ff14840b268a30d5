//! Collaborators the submission workflow talks to.
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ImagePage, ImageSubmission};

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures reported by an images API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("images api unreachable: {0}")]
    Transport(String),
    #[error("images api answered with status {0}")]
    Status(u16),
    #[error("images api returned an unreadable body: {0}")]
    Decode(String),
}

/// Remote collection of image records.
#[async_trait]
pub trait ImagesApi: Send + Sync {
    /// `POST api/images` with the submission as JSON.
    async fn create(&self, submission: &ImageSubmission) -> ApiResult<()>;

    /// `GET api/images`.
    async fn list(&self) -> ApiResult<ImagePage>;
}

/// Client-side cache of query results, addressed by tag.
pub trait QueryCache: Send + Sync {
    /// Mark entries under `tag` stale so the next read refetches.
    fn invalidate(&self, tag: &str);
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NotificationStatus {
    #[default]
    Default,
    Warning,
    Error,
}

/// Fire-and-forget message shown to the user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    pub title: &'static str,
    pub description: &'static str,
    pub status: NotificationStatus,
    pub duration: Option<Duration>,
    pub dismissible: bool,
}

pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Dialog hosting the form.
pub trait Modal {
    fn close(&mut self);
}
