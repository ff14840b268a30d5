//! In-process cache of image listings.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ImagePage;
use crate::services::ports::{ApiResult, ImagesApi, QueryCache};

/// Tag of the remote image collection.
pub const IMAGES_TAG: &str = "images";

/// Last fetched page per query tag.
#[derive(Debug, Default)]
pub struct ImageListCache {
    entries: Mutex<HashMap<String, ImagePage>>,
}

impl ImageListCache {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, ImagePage>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, tag: &str) -> Option<ImagePage> {
        self.entries().get(tag).cloned()
    }

    pub fn put(&self, tag: &str, page: ImagePage) {
        self.entries().insert(tag.to_string(), page);
    }

    /// Cached image listing, fetched from `api` on a miss.
    pub async fn images(&self, api: &dyn ImagesApi) -> ApiResult<ImagePage> {
        if let Some(page) = self.get(IMAGES_TAG) {
            return Ok(page);
        }

        let page = api.list().await?;
        log::debug!("Fetched {} images", page.data.len());
        self.put(IMAGES_TAG, page.clone());
        Ok(page)
    }
}

impl QueryCache for ImageListCache {
    fn invalidate(&self, tag: &str) {
        if self.entries().remove(tag).is_some() {
            log::debug!("Invalidated cached query `{tag}`");
        }
    }
}
