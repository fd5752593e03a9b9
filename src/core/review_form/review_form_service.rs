// Business logic for the "Add Review" block shown on paper detail pages.
// Decides whether the current viewer gets the review-creation form and, if
// so, hands back a pre-populated draft for the host's form machinery to
// render. Form submission and saving are entirely the host's problem.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Cache tag invalidating the block whenever any review is created/changed.
pub const REVIEW_LIST_CACHE_TAG: &str = "node_list:review";

/// The content node the current route points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub id: u64,
    pub bundle: String,
}

impl PageNode {
    pub fn new(id: u64, bundle: impl Into<String>) -> Self {
        Self {
            id,
            bundle: bundle.into(),
        }
    }
}

/// The account viewing the page, with its granted permissions.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub uid: u64,
    permissions: HashSet<String>,
}

impl Viewer {
    pub fn new<I, S>(uid: u64, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uid,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// What the render result must vary or invalidate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheContext {
    User,
    UserPermissions,
    Route,
}

/// Outcome of the block's access check, with the cache contexts the
/// decision depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub cache_contexts: Vec<CacheContext>,
}

impl AccessDecision {
    pub fn forbidden() -> Self {
        Self {
            allowed: false,
            cache_contexts: Vec::new(),
        }
    }

    pub fn allowed_if(condition: bool) -> Self {
        Self {
            allowed: condition,
            cache_contexts: Vec::new(),
        }
    }

    pub fn with_cache_contexts(mut self, contexts: &[CacheContext]) -> Self {
        self.cache_contexts.extend_from_slice(contexts);
        self
    }
}

/// An unsaved review pre-populated with the paper it reviews. The author
/// and everything else is filled in by the host's form when it saves.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub bundle: String,
    pub paper_id: u64,
}

/// Render instruction for the block body: draft plus the form mode the
/// host should build it with.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewForm {
    pub draft: ReviewDraft,
    pub form_mode: &'static str,
}

// ============================================================================
// CONFIG & ERRORS
// ============================================================================

/// Bundle and permission names are per-site configuration; these defaults
/// match the DCD Reviews content model.
#[derive(Debug, Clone)]
pub struct ReviewFormConfig {
    pub paper_bundle: String,
    pub review_bundle: String,
    /// Grants the self-review creation form.
    pub create_permission: String,
    /// The "lead" capability: whoever can view any review never gets the
    /// self-review form.
    pub view_any_permission: String,
}

impl Default for ReviewFormConfig {
    fn default() -> Self {
        Self {
            paper_bundle: "papers".to_string(),
            review_bundle: "review".to_string(),
            create_permission: "create review content".to_string(),
            view_any_permission: "view any review content".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReviewFormError {
    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Read access to existing review records.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Number of reviews authored by `uid` that reference `paper_id`.
    async fn count_by_author(&self, uid: u64, paper_id: u64) -> Result<u64, ReviewFormError>;
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct ReviewFormService<R: ReviewStore> {
    reviews: R,
    config: ReviewFormConfig,
}

impl<R: ReviewStore> ReviewFormService<R> {
    pub fn new(reviews: R) -> Self {
        Self::with_config(reviews, ReviewFormConfig::default())
    }

    pub fn with_config(reviews: R, config: ReviewFormConfig) -> Self {
        Self { reviews, config }
    }

    /// Access check, evaluated before any content is built.
    ///
    /// Leads (view-any permission) never see the self-review form; members
    /// see it only with the create permission, and only on paper pages.
    pub fn access(&self, viewer: &Viewer, node: Option<&PageNode>) -> AccessDecision {
        let Some(node) = node else {
            return AccessDecision::forbidden();
        };
        if node.bundle != self.config.paper_bundle {
            return AccessDecision::forbidden();
        }

        if viewer.has_permission(&self.config.view_any_permission) {
            return AccessDecision::forbidden()
                .with_cache_contexts(&[CacheContext::UserPermissions, CacheContext::Route]);
        }

        AccessDecision::allowed_if(viewer.has_permission(&self.config.create_permission))
            .with_cache_contexts(&[CacheContext::User, CacheContext::Route])
    }

    /// Block body: a pre-populated creation form, or nothing when the
    /// viewer already reviewed this paper (or the route check fails again).
    pub async fn build(
        &self,
        viewer: &Viewer,
        node: Option<&PageNode>,
    ) -> Result<Option<ReviewForm>, ReviewFormError> {
        // Re-check the route even though access() already did: build and
        // access run as separate calls from the host.
        let Some(node) = node else {
            return Ok(None);
        };
        if node.bundle != self.config.paper_bundle {
            return Ok(None);
        }

        let existing = self.reviews.count_by_author(viewer.uid, node.id).await?;
        if existing > 0 {
            return Ok(None);
        }

        Ok(Some(ReviewForm {
            draft: ReviewDraft {
                bundle: self.config.review_bundle.clone(),
                paper_id: node.id,
            },
            form_mode: "default",
        }))
    }
}

// ============================================================================
// TESTS
// ============================================================================
