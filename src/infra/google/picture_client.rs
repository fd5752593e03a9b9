use async_trait::async_trait;
use reqwest::Client;

use crate::core::profile_sync::{PictureSource, ProfileSyncError};

/// Downloads profile pictures over plain unauthenticated GET. Google serves
/// avatar URLs publicly, so no token is involved here.
pub struct HttpPictureSource {
    client: Client,
}

impl HttpPictureSource {
    pub fn new() -> Result<Self, ProfileSyncError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProfileSyncError::Picture(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PictureSource for HttpPictureSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProfileSyncError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProfileSyncError::Picture(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProfileSyncError::Picture(format!(
                "Picture fetch returned {}",
                status
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProfileSyncError::Picture(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
