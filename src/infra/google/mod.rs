// Google-facing HTTP clients.
#![allow(unused_imports)]

pub mod people_client;
pub mod picture_client;

// Re-export for convenience
pub use people_client::GooglePeopleClient;
pub use picture_client::HttpPictureSource;
