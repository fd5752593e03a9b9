// Sources of pending social-auth events.
#![allow(unused_imports)]

pub mod json_spool;

// Re-export for convenience
pub use json_spool::JsonEventSpool;
