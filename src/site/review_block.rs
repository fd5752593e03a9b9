// The "Add Review" block plugin. Thin wrapper over the core review-form
// service that speaks the host's block vocabulary: an access check run
// before rendering, a build step producing the block body, and the cache
// metadata the host needs to cache the result per user and route.

use crate::core::review_form::{
    AccessDecision, CacheContext, PageNode, ReviewForm, ReviewFormError, ReviewFormService,
    ReviewStore, Viewer, REVIEW_LIST_CACHE_TAG,
};

/// The current request's route, as far as this block cares: the node the
/// page is about, if the route has one.
#[derive(Debug, Clone, Default)]
pub struct RouteMatch {
    pub node: Option<PageNode>,
}

impl RouteMatch {
    pub fn for_node(node: PageNode) -> Self {
        Self { node: Some(node) }
    }
}

pub struct AddReviewFormBlock<R: ReviewStore> {
    service: ReviewFormService<R>,
}

impl<R: ReviewStore> AddReviewFormBlock<R> {
    pub fn new(service: ReviewFormService<R>) -> Self {
        Self { service }
    }

    /// Whether the block renders at all for this viewer on this route.
    pub fn access(&self, viewer: &Viewer, route: &RouteMatch) -> AccessDecision {
        self.service.access(viewer, route.node.as_ref())
    }

    /// The block body. `None` means render nothing.
    pub async fn build(
        &self,
        viewer: &Viewer,
        route: &RouteMatch,
    ) -> Result<Option<ReviewForm>, ReviewFormError> {
        self.service.build(viewer, route.node.as_ref()).await
    }

    /// Block-level cache contexts, merged with whatever the access
    /// decision adds.
    pub fn cache_contexts(&self) -> Vec<CacheContext> {
        vec![CacheContext::User, CacheContext::Route]
    }

    /// Cache tags: any change to review content invalidates the block.
    pub fn cache_tags(&self) -> Vec<String> {
        vec![REVIEW_LIST_CACHE_TAG.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::reviews::InMemoryReviewStore;

    fn block(reviews: InMemoryReviewStore) -> AddReviewFormBlock<InMemoryReviewStore> {
        AddReviewFormBlock::new(ReviewFormService::new(reviews))
    }

    fn paper_route(id: u64) -> RouteMatch {
        RouteMatch::for_node(PageNode::new(id, "papers"))
    }

    #[tokio::test]
    async fn member_without_prior_review_gets_the_form() {
        let block = block(InMemoryReviewStore::new());
        let member = Viewer::new(1, ["create review content"]);
        let route = paper_route(10);

        assert!(block.access(&member, &route).allowed);
        let form = block
            .build(&member, &route)
            .await
            .unwrap()
            .expect("form rendered");
        assert_eq!(form.draft.paper_id, 10);
        assert_eq!(form.draft.bundle, "review");
    }

    #[tokio::test]
    async fn member_with_existing_review_sees_nothing() {
        let reviews = InMemoryReviewStore::new();
        reviews.add_review(1, 10);
        let block = block(reviews);
        let member = Viewer::new(1, ["create review content"]);
        let route = paper_route(10);

        // Access still passes; the build step is what goes empty.
        assert!(block.access(&member, &route).allowed);
        assert_eq!(block.build(&member, &route).await.unwrap(), None);
    }

    #[tokio::test]
    async fn leads_never_see_the_form() {
        let block = block(InMemoryReviewStore::new());
        let lead = Viewer::new(2, ["create review content", "view any review content"]);
        let route = paper_route(10);

        assert!(!block.access(&lead, &route).allowed);
    }

    #[tokio::test]
    async fn non_paper_routes_render_nothing() {
        let block = block(InMemoryReviewStore::new());
        let member = Viewer::new(1, ["create review content"]);

        let no_node = RouteMatch::default();
        assert!(!block.access(&member, &no_node).allowed);
        assert_eq!(block.build(&member, &no_node).await.unwrap(), None);

        let article = RouteMatch::for_node(PageNode::new(5, "article"));
        assert!(!block.access(&member, &article).allowed);
        assert_eq!(block.build(&member, &article).await.unwrap(), None);
    }

    #[test]
    fn cache_metadata_varies_by_user_and_route() {
        let block = block(InMemoryReviewStore::new());

        assert_eq!(
            block.cache_contexts(),
            vec![CacheContext::User, CacheContext::Route]
        );
        assert_eq!(block.cache_tags(), vec!["node_list:review".to_string()]);
    }
}
