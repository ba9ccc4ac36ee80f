// Audit logging for moderation decisions.
//
// Writes are best-effort: a failed append is logged and reported back as a
// `SideEffect`, never as an error the caller could propagate with `?`.

use super::content_store::StoreError;
use super::moderation_models::{ModerationLogEntry, ModerationLogQuery, ModerationLogRecord};
use async_trait::async_trait;

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 200;

/// Outcome of a best-effort side effect.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Completed,
    Skipped,
    Failed(String),
}

impl SideEffect {
    pub fn is_failed(&self) -> bool {
        matches!(self, SideEffect::Failed(_))
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Append-only moderation log.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: &ModerationLogEntry) -> Result<(), StoreError>;

    /// Newest first.
    async fn query(&self, query: &ModerationLogQuery)
        -> Result<Vec<ModerationLogRecord>, StoreError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct AuditService<A: AuditStore> {
    store: A,
}

impl<A: AuditStore> AuditService<A> {
    pub fn new(store: A) -> Self {
        Self { store }
    }

    /// Record a decision. Failures are logged and swallowed.
    pub async fn record(&self, entry: ModerationLogEntry) -> SideEffect {
        match self.store.append(&entry).await {
            Ok(()) => SideEffect::Completed,
            Err(e) => {
                tracing::warn!(
                    action = %entry.action,
                    target_type = %entry.target_type,
                    target_id = %entry.target_id,
                    "Failed to write moderation log: {}",
                    e
                );
                SideEffect::Failed(e.to_string())
            }
        }
    }

    pub async fn history(
        &self,
        query: &ModerationLogQuery,
    ) -> Result<Vec<ModerationLogRecord>, StoreError> {
        let mut query = query.clone();
        query.limit = Some(
            query
                .limit
                .unwrap_or(DEFAULT_HISTORY_LIMIT)
                .clamp(1, MAX_HISTORY_LIMIT),
        );
        self.store.query(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::{Actor, ContentType, ModerationAction};
    use std::sync::Mutex;

    struct FlakyAuditStore {
        fail: bool,
        seen_limit: Mutex<Option<u32>>,
    }

    #[async_trait]
    impl AuditStore for FlakyAuditStore {
        async fn append(&self, _entry: &ModerationLogEntry) -> Result<(), StoreError> {
            if self.fail {
                Err(StoreError::StorageError("disk full".to_string()))
            } else {
                Ok(())
            }
        }

        async fn query(
            &self,
            query: &ModerationLogQuery,
        ) -> Result<Vec<ModerationLogRecord>, StoreError> {
            *self.seen_limit.lock().unwrap() = query.limit;
            Ok(Vec::new())
        }
    }

    fn entry() -> ModerationLogEntry {
        ModerationLogEntry {
            actor: Actor::Human("mod-1".to_string()),
            action: ModerationAction::HideContent,
            target_type: ContentType::Topic,
            target_id: "t1".to_string(),
            reason: Some("off topic".to_string()),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_failed_append_is_reported_not_raised() {
        let service = AuditService::new(FlakyAuditStore {
            fail: true,
            seen_limit: Mutex::new(None),
        });

        let outcome = service.record(entry()).await;
        assert!(outcome.is_failed());
    }

    #[tokio::test]
    async fn test_successful_append() {
        let service = AuditService::new(FlakyAuditStore {
            fail: false,
            seen_limit: Mutex::new(None),
        });

        assert_eq!(service.record(entry()).await, SideEffect::Completed);
    }

    #[tokio::test]
    async fn test_history_limit_is_clamped() {
        let store = FlakyAuditStore {
            fail: false,
            seen_limit: Mutex::new(None),
        };
        let service = AuditService::new(store);

        service.history(&ModerationLogQuery::default()).await.unwrap();
        assert_eq!(
            *service.store.seen_limit.lock().unwrap(),
            Some(DEFAULT_HISTORY_LIMIT)
        );

        let greedy = ModerationLogQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        service.history(&greedy).await.unwrap();
        assert_eq!(
            *service.store.seen_limit.lock().unwrap(),
            Some(MAX_HISTORY_LIMIT)
        );
    }
}
