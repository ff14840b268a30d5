//! HTTP client for the remote images API.
use async_trait::async_trait;
use reqwest::Client;

use crate::domain::{ImagePage, ImageSubmission};
use crate::services::ports::{ApiError, ApiResult, ImagesApi};

#[derive(Clone, Debug)]
pub struct HttpImagesApi {
    client: Client,
    base_url: String,
}

impl HttpImagesApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `{base_url}/api/images`.
    pub fn endpoint(&self) -> String {
        format!("{}/api/images", self.base_url.trim_end_matches('/'))
    }
}

fn map_error(err: reqwest::Error) -> ApiError {
    match err.status() {
        Some(status) => ApiError::Status(status.as_u16()),
        None if err.is_decode() => ApiError::Decode(err.to_string()),
        None => ApiError::Transport(err.to_string()),
    }
}

#[async_trait]
impl ImagesApi for HttpImagesApi {
    async fn create(&self, submission: &ImageSubmission) -> ApiResult<()> {
        self.client
            .post(self.endpoint())
            .json(submission)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(map_error)?;
        Ok(())
    }

    async fn list(&self) -> ApiResult<ImagePage> {
        let response = self
            .client
            .get(self.endpoint())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(map_error)?;

        response.json::<ImagePage>().await.map_err(map_error)
    }
}
