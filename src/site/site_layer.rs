// The site module is the surface the host CMS consumes: the social-auth
// event subscriber and the block plugins wrapping the core services.

#[path = "social_auth.rs"]
pub mod social_auth;

#[path = "review_block.rs"]
pub mod review_block;
