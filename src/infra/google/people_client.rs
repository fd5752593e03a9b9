use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::profile_sync::{PeopleDirectory, ProfileSyncError};

const PEOPLE_API_BASE: &str = "https://people.googleapis.com";

/// Minimal Google People API client. It deliberately exposes only the one
/// lookup the sync service needs: the signed-in person's phone numbers,
/// authorized by the OAuth access token from the login event.
pub struct GooglePeopleClient {
    client: Client,
    base_url: String,
}

impl GooglePeopleClient {
    pub fn new() -> Result<Self, ProfileSyncError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProfileSyncError::PeopleLookup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: PEOPLE_API_BASE.to_string(),
        })
    }

    /// Point the client at a different host. Used by tests.
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct Person {
    #[serde(default, rename = "phoneNumbers")]
    phone_numbers: Vec<PhoneNumber>,
}

#[derive(Debug, Deserialize)]
struct PhoneNumber {
    value: Option<String>,
}

/// The first listed phone number's value, if the person has any.
fn first_phone_number(body: &str) -> Result<Option<String>, ProfileSyncError> {
    let person: Person =
        serde_json::from_str(body).map_err(|e| ProfileSyncError::PeopleLookup(e.to_string()))?;
    Ok(person.phone_numbers.into_iter().next().and_then(|n| n.value))
}

#[async_trait]
impl PeopleDirectory for GooglePeopleClient {
    async fn primary_phone(
        &self,
        access_token: &str,
    ) -> Result<Option<String>, ProfileSyncError> {
        let url = format!("{}/v1/people/me", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("personFields", "phoneNumbers")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProfileSyncError::PeopleLookup(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProfileSyncError::PeopleLookup(format!(
                "People API returned {}",
                status
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ProfileSyncError::PeopleLookup(e.to_string()))?;
        first_phone_number(&body)
    }
}
