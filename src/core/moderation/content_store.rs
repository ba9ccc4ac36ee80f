// Content type adapters - one port, four implementations.
//
// Articles and jobs have a status column, topics and replies only have
// `is_deleted` plus a spam score. The registry below hides that so the
// moderation service can treat every type alike, while the no-op branches
// stay visible in each adapter implementation.

use super::moderation_models::{
    ContentFilters, ContentItem, ContentStatus, ContentType, STATUS_ACTIVE, STATUS_DELETED,
};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Error returned by every storage port in the moderation module.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{content_type} {id} not found")]
    NotFound { content_type: String, id: String },

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl StoreError {
    pub fn not_found(content_type: impl ToString, id: impl ToString) -> Self {
        StoreError::NotFound {
            content_type: content_type.to_string(),
            id: id.to_string(),
        }
    }
}

// ============================================================================
// ADAPTER TRAIT (PORT)
// ============================================================================

/// Read/update/delete access to one content type.
#[async_trait]
pub trait ContentAdapter: Send + Sync {
    /// The content type this adapter serves.
    fn content_type(&self) -> ContentType;

    /// Fetch every item matching the filters, newest first.
    async fn fetch_many(&self, filters: &ContentFilters) -> Result<Vec<ContentItem>, StoreError>;

    /// Fetch a single item. `Ok(None)` when the id does not exist.
    async fn fetch_one(&self, id: &str) -> Result<Option<ContentItem>, StoreError>;

    /// Move the item to a moderation status.
    ///
    /// Topics and replies only persist `Deleted`; the other statuses are
    /// accepted and leave the row untouched. Missing ids are `NotFound`.
    async fn set_status(&self, id: &str, status: ContentStatus) -> Result<(), StoreError>;

    /// Physically remove the item.
    async fn hard_delete(&self, id: &str) -> Result<(), StoreError>;

    /// Persist a spam score. A no-op for types without a spam score column.
    async fn set_spam_score(&self, id: &str, score: u8) -> Result<(), StoreError>;
}

/// Status string shown for topics and replies.
pub fn derived_status(is_deleted: bool) -> String {
    if is_deleted {
        STATUS_DELETED.to_string()
    } else {
        STATUS_ACTIVE.to_string()
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Selects the adapter for a content type.
pub struct ContentRegistry {
    article: Box<dyn ContentAdapter>,
    topic: Box<dyn ContentAdapter>,
    reply: Box<dyn ContentAdapter>,
    job: Box<dyn ContentAdapter>,
}

impl ContentRegistry {
    pub fn new(
        article: Box<dyn ContentAdapter>,
        topic: Box<dyn ContentAdapter>,
        reply: Box<dyn ContentAdapter>,
        job: Box<dyn ContentAdapter>,
    ) -> Self {
        debug_assert_eq!(article.content_type(), ContentType::Article);
        debug_assert_eq!(topic.content_type(), ContentType::Topic);
        debug_assert_eq!(reply.content_type(), ContentType::Reply);
        debug_assert_eq!(job.content_type(), ContentType::Job);
        Self {
            article,
            topic,
            reply,
            job,
        }
    }

    pub fn adapter(&self, content_type: ContentType) -> &dyn ContentAdapter {
        match content_type {
            ContentType::Article => self.article.as_ref(),
            ContentType::Topic => self.topic.as_ref(),
            ContentType::Reply => self.reply.as_ref(),
            ContentType::Job => self.job.as_ref(),
        }
    }

    pub async fn fetch_many(
        &self,
        content_type: ContentType,
        filters: &ContentFilters,
    ) -> Result<Vec<ContentItem>, StoreError> {
        self.adapter(content_type).fetch_many(filters).await
    }

    pub async fn fetch_one(
        &self,
        content_type: ContentType,
        id: &str,
    ) -> Result<Option<ContentItem>, StoreError> {
        self.adapter(content_type).fetch_one(id).await
    }

    pub async fn set_status(
        &self,
        content_type: ContentType,
        id: &str,
        status: ContentStatus,
    ) -> Result<(), StoreError> {
        self.adapter(content_type).set_status(id, status).await
    }

    pub async fn hard_delete(&self, content_type: ContentType, id: &str) -> Result<(), StoreError> {
        self.adapter(content_type).hard_delete(id).await
    }

    pub async fn set_spam_score(
        &self,
        content_type: ContentType,
        id: &str,
        score: u8,
    ) -> Result<(), StoreError> {
        self.adapter(content_type).set_spam_score(id, score).await
    }
}
