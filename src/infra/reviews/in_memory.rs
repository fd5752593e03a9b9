// In-memory implementation of ReviewStore for tests and local development.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::core::review_form::{ReviewFormError, ReviewStore};

/// A saved review record: who reviewed which paper.
#[derive(Debug, Clone)]
struct StoredReview {
    uid: u64,
    paper_id: u64,
}

pub struct InMemoryReviewStore {
    reviews: DashMap<u64, StoredReview>,
    next_id: AtomicU64,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self {
            reviews: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Record a review, as the host's form submission would.
    pub fn add_review(&self, uid: u64, paper_id: u64) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.reviews.insert(id, StoredReview { uid, paper_id });
        id
    }
}

impl Default for InMemoryReviewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn count_by_author(&self, uid: u64, paper_id: u64) -> Result<u64, ReviewFormError> {
        let count = self
            .reviews
            .iter()
            .filter(|r| r.uid == uid && r.paper_id == paper_id)
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_only_matching_author_and_paper() {
        let store = InMemoryReviewStore::new();
        store.add_review(1, 10);
        store.add_review(1, 11);
        store.add_review(2, 10);

        assert_eq!(store.count_by_author(1, 10).await.unwrap(), 1);
        assert_eq!(store.count_by_author(1, 12).await.unwrap(), 0);
        assert_eq!(store.count_by_author(3, 10).await.unwrap(), 0);
    }
}
