//! Application services orchestrating the form workflow and its side effects.
pub mod api;
pub mod cache;
pub mod form_state;
pub mod ports;
pub mod submission;
pub mod upload;

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("selected image failed validation")]
    InvalidImage,
    #[error("invalid upload url")]
    InvalidUrl,
    #[error("failed to prepare storage")]
    StorageSetup(#[source] std::io::Error),
    #[error("failed to save file")]
    SaveFile(#[source] std::io::Error),
}
