// Event subscription for social-login account creation. This is the seam
// between the host's login machinery and the core sync service: the host
// (or the spool the worker polls) emits events, and the subscriber decides
// which ones matter.

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::profile_sync::{
    PeopleDirectory, PictureSource, PictureStore, ProfileStore, ProfileSyncService,
    SocialIdentity,
};

/// Plugin id the Google login provider reports on its events.
pub const GOOGLE_PROVIDER_ID: &str = "social_auth_google";

/// Events emitted when accounts are provisioned through a login provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SocialAuthEvent {
    UserCreated {
        provider: String,
        user_id: u64,
        #[serde(default)]
        identity: SocialIdentity,
    },
}

/// Where pending social-auth events come from.
#[async_trait]
pub trait AuthEventSource: Send + Sync {
    /// Remove and return every event currently waiting.
    async fn drain(&self) -> anyhow::Result<Vec<SocialAuthEvent>>;
}

/// Routes "user created" events into the profile sync service.
///
/// Events from providers other than the configured one are ignored
/// outright - no log entry, no work done.
pub struct SocialAuthSubscriber<P, D, S, F>
where
    P: ProfileStore,
    D: PeopleDirectory,
    S: PictureSource,
    F: PictureStore,
{
    sync: ProfileSyncService<P, D, S, F>,
    provider_id: String,
}

impl<P, D, S, F> SocialAuthSubscriber<P, D, S, F>
where
    P: ProfileStore,
    D: PeopleDirectory,
    S: PictureSource,
    F: PictureStore,
{
    pub fn new(sync: ProfileSyncService<P, D, S, F>) -> Self {
        Self::for_provider(sync, GOOGLE_PROVIDER_ID)
    }

    pub fn for_provider(
        sync: ProfileSyncService<P, D, S, F>,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            sync,
            provider_id: provider_id.into(),
        }
    }

    pub async fn handle(&self, event: &SocialAuthEvent) {
        match event {
            SocialAuthEvent::UserCreated {
                provider,
                user_id,
                identity,
            } => {
                // Only act on the configured provider's sign-ins.
                if provider != &self.provider_id {
                    return;
                }
                self.sync.on_user_created(*user_id, identity).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::profile_sync::{Profile, ProfileSyncError, StoredFile};
    use crate::infra::profiles::InMemoryProfileStore;

    /// Lets the test keep a handle on the store after the service takes
    /// ownership of its end.
    struct SharedProfiles(Arc<InMemoryProfileStore>);

    #[async_trait]
    impl ProfileStore for SharedProfiles {
        async fn find_active(&self, uid: u64) -> Result<Option<Profile>, ProfileSyncError> {
            self.0.find_active(uid).await
        }

        async fn save(&self, profile: &Profile) -> Result<u64, ProfileSyncError> {
            self.0.save(profile).await
        }
    }

    struct NoPhone;

    #[async_trait]
    impl PeopleDirectory for NoPhone {
        async fn primary_phone(
            &self,
            _token: &str,
        ) -> Result<Option<String>, ProfileSyncError> {
            Ok(None)
        }
    }

    struct NoPicture;

    #[async_trait]
    impl PictureSource for NoPicture {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, ProfileSyncError> {
            Ok(Vec::new())
        }
    }

    struct NoFiles;

    #[async_trait]
    impl PictureStore for NoFiles {
        async fn write_permanent(
            &self,
            _data: &[u8],
            _destination: &str,
        ) -> Result<StoredFile, ProfileSyncError> {
            Err(ProfileSyncError::FileStore(
                "no file writes expected in this test".to_string(),
            ))
        }
    }

    fn subscriber(
        profiles: Arc<InMemoryProfileStore>,
    ) -> SocialAuthSubscriber<SharedProfiles, NoPhone, NoPicture, NoFiles> {
        let sync = ProfileSyncService::new(SharedProfiles(profiles), NoPhone, NoPicture, NoFiles);
        SocialAuthSubscriber::new(sync)
    }

    fn google_event(user_id: u64) -> SocialAuthEvent {
        SocialAuthEvent::UserCreated {
            provider: GOOGLE_PROVIDER_ID.to_string(),
            user_id,
            identity: SocialIdentity {
                first_name: Some("Ada".to_string()),
                email: Some("a@x.com".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn google_events_create_a_profile() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let subscriber = subscriber(Arc::clone(&profiles));

        subscriber.handle(&google_event(42)).await;

        let profile = profiles.find_active(42).await.unwrap().expect("profile");
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(profile.email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn repeated_events_never_duplicate_the_profile() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let subscriber = subscriber(Arc::clone(&profiles));

        subscriber.handle(&google_event(42)).await;
        subscriber.handle(&google_event(42)).await;

        assert_eq!(profiles.count_for_user(42), 1);
    }

    #[tokio::test]
    async fn other_providers_are_ignored() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let subscriber = subscriber(Arc::clone(&profiles));

        let event = SocialAuthEvent::UserCreated {
            provider: "social_auth_facebook".to_string(),
            user_id: 42,
            identity: SocialIdentity::default(),
        };
        subscriber.handle(&event).await;

        assert_eq!(profiles.count_for_user(42), 0);
    }

    #[test]
    fn events_deserialize_from_spool_json() {
        let json = r#"{
            "event": "user_created",
            "provider": "social_auth_google",
            "user_id": 7,
            "identity": {"first_name": "Ada", "picture_url": "https://x.com/a.png"}
        }"#;

        let SocialAuthEvent::UserCreated {
            provider,
            user_id,
            identity,
        } = serde_json::from_str(json).unwrap();
        assert_eq!(provider, "social_auth_google");
        assert_eq!(user_id, 7);
        assert_eq!(identity.first_name.as_deref(), Some("Ada"));
        assert_eq!(identity.picture_url.as_deref(), Some("https://x.com/a.png"));
        assert_eq!(identity.access_token, None);
    }
}
