// File storage under the site's public files root.
#![allow(unused_imports)]

pub mod disk_store;

// Re-export for convenience
pub use disk_store::DiskFileStore;
