// This is the entry point of the profile sync worker.
//
// **Architecture Overview:**
// - `core/` = Business logic (storage- and HTTP-agnostic)
// - `infra/` = Implementations of core traits (SQLite, Google APIs, disk)
// - `site/` = CMS-facing adapters (event subscriber, block plugins)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Poll the social-auth event spool and feed events to the subscriber
//
// The review block has no place in this worker - it is a per-request
// surface the host site drives through the library API.

use std::time::Duration;

use dcd_reviews::core::profile_sync::ProfileSyncService;
use dcd_reviews::infra::events::JsonEventSpool;
use dcd_reviews::infra::files::DiskFileStore;
use dcd_reviews::infra::google::{GooglePeopleClient, HttpPictureSource};
use dcd_reviews::infra::profiles::SqliteProfileStore;
use dcd_reviews::site::social_auth::{AuthEventSource, SocialAuthSubscriber};

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for SQLite files");
    let profiles_db_path = format!("{}/profiles.db", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let profile_store = SqliteProfileStore::new(&profiles_db_path)
        .await
        .expect("Failed to initialize profile store");

    let people_client = GooglePeopleClient::new().expect("Failed to create People API client");
    let picture_source = HttpPictureSource::new().expect("Failed to create picture client");

    // Where the host site serves public files from; profile pictures land
    // under <root>/user_pictures/.
    let public_files_root =
        std::env::var("PUBLIC_FILES_ROOT").unwrap_or_else(|_| "public".to_string());
    let file_store = DiskFileStore::new(
        &public_files_root,
        format!("{}/file_manifest.json", data_dir),
    );

    let sync_service =
        ProfileSyncService::new(profile_store, people_client, picture_source, file_store);
    let subscriber = SocialAuthSubscriber::new(sync_service);

    let spool_path = std::env::var("AUTH_EVENT_SPOOL")
        .unwrap_or_else(|_| format!("{}/social_auth_events.json", data_dir));
    let spool = JsonEventSpool::new(&spool_path);

    let poll_secs = std::env::var("AUTH_EVENT_POLL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10);

    tracing::info!(spool = %spool_path, poll_secs, "Profile sync worker started");

    // Drain pending events, process them, sleep, repeat.
    loop {
        match spool.drain().await {
            Ok(events) => {
                if !events.is_empty() {
                    tracing::info!("Processing {} social auth events", events.len());
                }
                for event in &events {
                    subscriber.handle(event).await;
                }
            }
            Err(err) => tracing::warn!("Failed to read auth event spool: {}", err),
        }

        tokio::time::sleep(Duration::from_secs(poll_secs)).await;
    }
}
