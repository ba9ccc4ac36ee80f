// Storage-side shape of a content row, shared by the SQLite and in-memory
// adapters. Both convert it into the unified `ContentItem` the same way.

use crate::core::moderation::content_store::derived_status;
use crate::core::moderation::{
    is_flagged_by_system, preview, ContentAuthor, ContentItem, ContentStatus, ContentType,
    StoreError,
};
use chrono::{DateTime, SecondsFormat, Utc};

/// One row of articles, jobs, topics or replies.
///
/// `status` is only meaningful for articles and jobs, `is_deleted` and
/// `spam_score` only for topics and replies.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    pub id: String,
    pub title: Option<String>,
    pub body: String,
    pub author: ContentAuthor,
    pub status: ContentStatus,
    pub is_deleted: bool,
    pub spam_score: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    pub fn to_item(&self, content_type: ContentType) -> ContentItem {
        let status = if content_type.has_status_column() {
            self.status.as_str().to_string()
        } else {
            derived_status(self.is_deleted)
        };
        let spam_score = if content_type.supports_spam_score() {
            self.spam_score
        } else {
            None
        };

        ContentItem {
            id: self.id.clone(),
            content_type,
            title: self.title.clone(),
            content: preview(&self.body),
            author_id: self.author.id.clone(),
            author: Some(self.author.clone()),
            status,
            spam_score,
            report_count: 0,
            created_at: self.created_at,
            updated_at: self.updated_at,
            flagged_by_system: is_flagged_by_system(spam_score),
        }
    }
}

/// RFC 3339 with millisecond precision, so text order is time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::StorageError(format!("Invalid timestamp '{}': {}", raw, e)))
}
