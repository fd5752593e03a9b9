// This is the profile sync module - it contains ALL the business logic for
// copying Google sign-in data onto a user's profile record.
// Notice how this module has NO storage- or HTTP-specific code (no sqlx, no
// reqwest imports). It talks to the outside world through the traits below,
// so the same logic runs against SQLite in production and stubs in tests.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// The data a social login provider hands us when an account is created.
///
/// Every field is optional: providers differ in what they return, and a
/// missing value simply means "don't touch the matching profile field".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialIdentity {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub provider_user_id: Option<String>,
    pub picture_url: Option<String>,
    pub access_token: Option<String>,
}

impl SocialIdentity {
    /// The identity value feeding a given profile field, if the provider
    /// supplied one. Phone and photo are filled through their own paths and
    /// never come straight out of the identity payload.
    fn value(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::FirstName => self.first_name.as_deref(),
            ProfileField::LastName => self.last_name.as_deref(),
            ProfileField::FullName => self.full_name.as_deref(),
            ProfileField::Email => self.email.as_deref(),
            ProfileField::ProviderId => self.provider_user_id.as_deref(),
            ProfileField::Phone | ProfileField::Photo => None,
        }
    }
}

/// The fields a profile record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    FirstName,
    LastName,
    FullName,
    Email,
    ProviderId,
    Phone,
    Photo,
}

impl ProfileField {
    const ALL: [ProfileField; 7] = [
        ProfileField::FirstName,
        ProfileField::LastName,
        ProfileField::FullName,
        ProfileField::Email,
        ProfileField::ProviderId,
        ProfileField::Phone,
        ProfileField::Photo,
    ];
}

/// Identity fields copied verbatim onto the profile, in mapping order.
const MAPPED_FIELDS: [ProfileField; 5] = [
    ProfileField::FirstName,
    ProfileField::LastName,
    ProfileField::FullName,
    ProfileField::Email,
    ProfileField::ProviderId,
];

/// Which fields the site's profile type actually has. Sites trim this down
/// when their profile form doesn't carry, say, a phone or photo field.
#[derive(Debug, Clone)]
pub struct ProfileFieldSet {
    enabled: std::collections::HashSet<ProfileField>,
}

impl ProfileFieldSet {
    pub fn all() -> Self {
        Self {
            enabled: ProfileField::ALL.into_iter().collect(),
        }
    }

    pub fn without(mut self, field: ProfileField) -> Self {
        self.enabled.remove(&field);
        self
    }

    pub fn supports(&self, field: ProfileField) -> bool {
        self.enabled.contains(&field)
    }
}

impl Default for ProfileFieldSet {
    fn default() -> Self {
        Self::all()
    }
}

/// A user's profile record. One active profile per user is assumed; if the
/// store holds several, the first one it returns wins and the rest are
/// ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Storage id. `None` until the first save.
    pub id: Option<u64>,
    pub uid: u64,
    pub active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub provider_id: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<PhotoField>,
}

impl Profile {
    /// A fresh, unsaved, active profile for the user.
    pub fn new(uid: u64) -> Self {
        Self {
            id: None,
            uid,
            active: true,
            first_name: None,
            last_name: None,
            full_name: None,
            email: None,
            provider_id: None,
            phone: None,
            photo: None,
        }
    }

    fn set_text(&mut self, field: ProfileField, value: &str) {
        let slot = match field {
            ProfileField::FirstName => &mut self.first_name,
            ProfileField::LastName => &mut self.last_name,
            ProfileField::FullName => &mut self.full_name,
            ProfileField::Email => &mut self.email,
            ProfileField::ProviderId => &mut self.provider_id,
            ProfileField::Phone | ProfileField::Photo => return,
        };
        *slot = Some(value.to_string());
    }
}

/// A profile's photo: reference to a stored file plus alt text.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoField {
    pub file_id: u64,
    pub alt: String,
}

/// A permanently stored file, as reported back by the file store.
/// `path` is the final relative path, which may differ from the requested
/// one when the store renamed to dodge a collision.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub id: u64,
    pub path: String,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ProfileSyncError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("People API error: {0}")]
    PeopleLookup(String),

    #[error("Picture download error: {0}")]
    Picture(String),

    #[error("File store error: {0}")]
    FileStore(String),
}

// ============================================================================
// STORAGE & LOOKUP TRAITS (PORTS)
// ============================================================================

/// Persistence for profile records.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The first active profile for the user, if any. "First" is whatever
    /// the backing storage yields first; callers must not assume more.
    async fn find_active(&self, uid: u64) -> Result<Option<Profile>, ProfileSyncError>;

    /// Persist the profile (insert or update), returning its storage id.
    async fn save(&self, profile: &Profile) -> Result<u64, ProfileSyncError>;
}

/// Lookup of supplementary contact data for the logged-in person.
#[async_trait]
pub trait PeopleDirectory: Send + Sync {
    /// The person's primary phone number, if the directory has one.
    async fn primary_phone(&self, access_token: &str)
        -> Result<Option<String>, ProfileSyncError>;
}

/// Fetches raw picture bytes from a URL.
#[async_trait]
pub trait PictureSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProfileSyncError>;
}

/// Stores binary files under the site's public files root.
#[async_trait]
pub trait PictureStore: Send + Sync {
    /// Write `data` at the relative `destination`, renaming rather than
    /// overwriting on collision, and flag the file permanent so it survives
    /// temporary-file cleanup.
    async fn write_permanent(
        &self,
        data: &[u8],
        destination: &str,
    ) -> Result<StoredFile, ProfileSyncError>;
}

// ============================================================================
// PICTURE EXTENSION DETECTION
// ============================================================================

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Extension from the URL path, lowercased, if it is a known image type.
fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or("");
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let extension = extension.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Extension guessed from the file's magic bytes, `jpg` when unrecognized.
fn sniffed_extension(data: &[u8]) -> &'static str {
    if data.len() >= 8 && data[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        "png"
    } else if data.len() >= 3 && data[0..3] == [0xFF, 0xD8, 0xFF] {
        "jpg"
    } else if data.len() >= 4 && data[0..4] == [0x47, 0x49, 0x46, 0x38] {
        "gif"
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "webp"
    } else {
        "jpg"
    }
}

fn picture_extension(url: &str, data: &[u8]) -> String {
    match url_extension(url) {
        Some(extension) => extension,
        None => sniffed_extension(data).to_string(),
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Directory (under the public files root) where profile pictures land.
const PICTURE_DIRECTORY: &str = "user_pictures";

/// Alt text attached to every synced profile picture.
const PICTURE_ALT: &str = "Google Profile Picture";

/// Copies Google sign-in data onto the new user's profile: name/email/id
/// fields from the identity payload, a phone number from the people
/// directory, and the avatar from the picture URL.
pub struct ProfileSyncService<P, D, S, F>
where
    P: ProfileStore,
    D: PeopleDirectory,
    S: PictureSource,
    F: PictureStore,
{
    profiles: P,
    people: D,
    pictures: S,
    files: F,
    fields: ProfileFieldSet,
}

impl<P, D, S, F> ProfileSyncService<P, D, S, F>
where
    P: ProfileStore,
    D: PeopleDirectory,
    S: PictureSource,
    F: PictureStore,
{
    pub fn new(profiles: P, people: D, pictures: S, files: F) -> Self {
        Self {
            profiles,
            people,
            pictures,
            files,
            fields: ProfileFieldSet::default(),
        }
    }

    /// Restrict syncing to the fields this site's profile type carries.
    pub fn with_fields(mut self, fields: ProfileFieldSet) -> Self {
        self.fields = fields;
        self
    }

    /// Entry point for a "user created" event. Never fails: whatever goes
    /// wrong is logged and swallowed so account creation itself is never
    /// affected by profile sync.
    pub async fn on_user_created(&self, user_id: u64, identity: &SocialIdentity) {
        if let Err(err) = self.sync_profile(user_id, identity).await {
            tracing::error!(
                timestamp = %utc_timestamp(),
                user_id,
                error = %err,
                "Error processing Google profile"
            );
        }
    }

    async fn sync_profile(
        &self,
        uid: u64,
        identity: &SocialIdentity,
    ) -> Result<(), ProfileSyncError> {
        let mut profile = match self.load_or_new_profile(uid).await {
            Some(profile) => profile,
            // Already logged; stop here so nothing is half-written.
            None => return Ok(()),
        };

        // Picture first, and best-effort: a failed download must not block
        // the rest of the field mapping.
        if self.fields.supports(ProfileField::Photo) {
            if let Some(url) = identity.picture_url.as_deref().filter(|u| !u.is_empty()) {
                if let Err(err) = self.save_profile_picture(&mut profile, uid, url).await {
                    tracing::error!(
                        timestamp = %utc_timestamp(),
                        user_id = uid,
                        error = %err,
                        "Failed to save profile picture"
                    );
                }
            }
        }

        // Unlike the picture path, a people-directory failure is NOT caught
        // here: it aborts the remaining mapping and the final save, and is
        // logged once by on_user_created.
        let phone = self.fetch_phone_number(identity).await?;

        for field in MAPPED_FIELDS {
            let Some(value) = identity.value(field) else {
                continue;
            };
            if value.is_empty() || !self.fields.supports(field) {
                continue;
            }
            profile.set_text(field, value);
        }

        if let Some(phone) = phone {
            if self.fields.supports(ProfileField::Phone) {
                profile.phone = Some(phone);
            }
        }

        // Single save at the very end - everything above only touched the
        // in-memory record.
        self.profiles.save(&profile).await?;
        Ok(())
    }

    async fn load_or_new_profile(&self, uid: u64) -> Option<Profile> {
        match self.profiles.find_active(uid).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => Some(Profile::new(uid)),
            Err(err) => {
                tracing::error!(
                    timestamp = %utc_timestamp(),
                    user_id = uid,
                    error = %err,
                    "Could not create or load profile"
                );
                None
            }
        }
    }

    async fn fetch_phone_number(
        &self,
        identity: &SocialIdentity,
    ) -> Result<Option<String>, ProfileSyncError> {
        let Some(token) = identity.access_token.as_deref() else {
            return Ok(None);
        };
        if token.is_empty() {
            return Ok(None);
        }
        self.people.primary_phone(token).await
    }

    async fn save_profile_picture(
        &self,
        profile: &mut Profile,
        uid: u64,
        url: &str,
    ) -> Result<(), ProfileSyncError> {
        let data = self.pictures.fetch(url).await?;
        if data.is_empty() {
            // Nothing came back; leave the photo field alone.
            return Ok(());
        }

        let extension = picture_extension(url, &data);
        let destination = format!("{}/google_{}.{}", PICTURE_DIRECTORY, uid, extension);
        let stored = self.files.write_permanent(&data, &destination).await?;

        profile.photo = Some(PhotoField {
            file_id: stored.id,
            alt: PICTURE_ALT.to_string(),
        });
        Ok(())
    }
}

/// UTC timestamp in the `YYYY-MM-DD HH:MM:SS` format the site's log
/// tooling expects on profile-sync entries.
fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ============================================================================
// TESTS
// ============================================================================
