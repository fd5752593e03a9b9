// In-memory implementation of ProfileStore, used by tests and local
// development. Follows the same contract as the SQLite implementation:
// "first active profile" means the one with the lowest id.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::core::profile_sync::{Profile, ProfileStore, ProfileSyncError};

pub struct InMemoryProfileStore {
    /// Maps profile id -> profile record.
    profiles: DashMap<u64, Profile>,
    next_id: AtomicU64,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// How many profiles exist for a user, active or not. Test helper.
    pub fn count_for_user(&self, uid: u64) -> usize {
        self.profiles.iter().filter(|p| p.uid == uid).count()
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_active(&self, uid: u64) -> Result<Option<Profile>, ProfileSyncError> {
        let found = self
            .profiles
            .iter()
            .filter(|p| p.uid == uid && p.active)
            .min_by_key(|p| p.id)
            .map(|p| p.value().clone());
        Ok(found)
    }

    async fn save(&self, profile: &Profile) -> Result<u64, ProfileSyncError> {
        let id = profile
            .id
            .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut stored = profile.clone();
        stored.id = Some(id);
        self.profiles.insert(id, stored);
        Ok(id)
    }
}
