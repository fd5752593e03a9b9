// Backend services for the DCD Reviews site.
//
// **Architecture Overview:**
// - `core/` = Business logic (storage- and HTTP-agnostic)
// - `infra/` = Implementations of core traits (SQLite, Google APIs, disk)
// - `site/` = CMS-facing adapters (event subscriber, block plugins)
//
// Two independent features live here:
// 1. Profile sync: when a user account is created through Google sign-in,
//    copy the identity data onto the user's profile record, look up a phone
//    number via the People API, and store the avatar.
// 2. The "Add Review" block: decide per paper page whether the viewer gets
//    a pre-populated review-creation form.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;
#[path = "site/site_layer.rs"]
pub mod site;
