// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "profile_sync/profile_sync_service.rs"]
pub mod profile_sync;

#[path = "review_form/review_form_service.rs"]
pub mod review_form;
