use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::site::social_auth::{AuthEventSource, SocialAuthEvent};

/// JSON-file inbox for social-auth events. The host site (or an export
/// job on its side) appends events to the file; the worker drains it on
/// each poll and leaves an empty array behind.
pub struct JsonEventSpool {
    path: PathBuf,
}

impl JsonEventSpool {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl AuthEventSource for JsonEventSpool {
    async fn drain(&self) -> anyhow::Result<Vec<SocialAuthEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(&self.path).await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let events: Vec<SocialAuthEvent> = serde_json::from_str(&text)?;
        fs::write(&self.path, "[]").await?;
        Ok(events)
    }
}
