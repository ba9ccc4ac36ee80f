// Spam scoring engine - wraps the pure scoring functions around the
// keyword table.
//
// `analyze_content` fails closed: if the keyword table cannot be read or a
// keyword cannot be compiled, the caller gets a zero score instead of an error.

use super::content_store::StoreError;
use super::moderation_models::{SpamAnalysisResult, SpamKeyword};
use super::spam_scoring::{score_text, SpamScoringConfig};
use async_trait::async_trait;
use thiserror::Error;

pub const DEFAULT_KEYWORD_SEVERITY: u8 = 1;
pub const MAX_KEYWORD_SEVERITY: u8 = 10;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SpamError {
    #[error("{0}")]
    InvalidKeyword(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
enum AnalysisError {
    #[error("keyword lookup failed: {0}")]
    Keywords(#[from] StoreError),

    #[error("keyword matcher failed: {0}")]
    Matcher(#[from] regex::Error),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Keyword table used by the keyword sub-score.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// Active keywords in table order.
    async fn active_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError>;

    /// Every keyword in table order, active or not.
    async fn list_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError>;

    /// Insert a keyword, or re-activate it with the new severity if it exists.
    async fn add_keyword(&self, keyword: &str, severity: u8) -> Result<SpamKeyword, StoreError>;

    /// Update a keyword in place. Unknown ids are `NotFound`.
    async fn update_keyword(
        &self,
        id: i64,
        severity: u8,
        is_active: bool,
    ) -> Result<(), StoreError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct SpamScoringService<K: KeywordStore> {
    store: K,
    config: SpamScoringConfig,
}

impl<K: KeywordStore> SpamScoringService<K> {
    pub fn new(store: K, config: SpamScoringConfig) -> Self {
        Self { store, config }
    }

    /// Score a piece of text. Never fails.
    pub async fn analyze_content(&self, content: &str, title: Option<&str>) -> SpamAnalysisResult {
        match self.try_analyze(content, title).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Spam analysis failed, returning empty result: {}", e);
                SpamAnalysisResult::failed()
            }
        }
    }

    /// Entry point reserved for a trained classifier. Uses the rule-based
    /// scorer until one exists.
    pub async fn analyze_with_ml_model(
        &self,
        content: &str,
        title: Option<&str>,
    ) -> SpamAnalysisResult {
        self.analyze_content(content, title).await
    }

    async fn try_analyze(
        &self,
        content: &str,
        title: Option<&str>,
    ) -> Result<SpamAnalysisResult, AnalysisError> {
        let keywords = self.store.active_keywords().await?;
        Ok(score_text(content, title, &keywords, &self.config)?)
    }

    /// Add a keyword (stored lowercased and active).
    pub async fn add_keyword(
        &self,
        keyword: &str,
        severity: Option<u8>,
    ) -> Result<SpamKeyword, SpamError> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Err(SpamError::InvalidKeyword(
                "Keyword must not be empty".to_string(),
            ));
        }
        let severity = validate_severity(severity.unwrap_or(DEFAULT_KEYWORD_SEVERITY))?;

        Ok(self.store.add_keyword(&keyword, severity).await?)
    }

    pub async fn update_keyword(
        &self,
        id: i64,
        severity: u8,
        is_active: bool,
    ) -> Result<(), SpamError> {
        let severity = validate_severity(severity)?;
        Ok(self.store.update_keyword(id, severity, is_active).await?)
    }

    pub async fn list_keywords(&self) -> Result<Vec<SpamKeyword>, SpamError> {
        Ok(self.store.list_keywords().await?)
    }
}

fn validate_severity(severity: u8) -> Result<u8, SpamError> {
    if (1..=MAX_KEYWORD_SEVERITY).contains(&severity) {
        Ok(severity)
    } else {
        Err(SpamError::InvalidKeyword(format!(
            "Severity must be between 1 and {}",
            MAX_KEYWORD_SEVERITY
        )))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// In-memory keyword table for testing
    struct MockKeywordStore {
        keywords: DashMap<i64, SpamKeyword>,
        next_id: AtomicI64,
    }

    impl MockKeywordStore {
        fn new() -> Self {
            Self {
                keywords: DashMap::new(),
                next_id: AtomicI64::new(1),
            }
        }

        fn sorted(&self) -> Vec<SpamKeyword> {
            let mut all: Vec<SpamKeyword> = self.keywords.iter().map(|k| k.clone()).collect();
            all.sort_by_key(|k| k.id);
            all
        }
    }

    #[async_trait]
    impl KeywordStore for MockKeywordStore {
        async fn active_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError> {
            Ok(self.sorted().into_iter().filter(|k| k.is_active).collect())
        }

        async fn list_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError> {
            Ok(self.sorted())
        }

        async fn add_keyword(
            &self,
            keyword: &str,
            severity: u8,
        ) -> Result<SpamKeyword, StoreError> {
            if let Some(mut existing) = self.keywords.iter_mut().find(|k| k.keyword == keyword) {
                existing.severity = severity;
                existing.is_active = true;
                return Ok(existing.clone());
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let stored = SpamKeyword {
                id,
                keyword: keyword.to_string(),
                severity,
                is_active: true,
            };
            self.keywords.insert(id, stored.clone());
            Ok(stored)
        }

        async fn update_keyword(
            &self,
            id: i64,
            severity: u8,
            is_active: bool,
        ) -> Result<(), StoreError> {
            let mut entry = self
                .keywords
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("keyword", id))?;
            entry.severity = severity;
            entry.is_active = is_active;
            Ok(())
        }
    }

    /// Keyword table that is always unreachable
    struct BrokenKeywordStore;

    #[async_trait]
    impl KeywordStore for BrokenKeywordStore {
        async fn active_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError> {
            Err(StoreError::StorageError("connection refused".to_string()))
        }

        async fn list_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError> {
            Err(StoreError::StorageError("connection refused".to_string()))
        }

        async fn add_keyword(&self, _: &str, _: u8) -> Result<SpamKeyword, StoreError> {
            Err(StoreError::StorageError("connection refused".to_string()))
        }

        async fn update_keyword(&self, _: i64, _: u8, _: bool) -> Result<(), StoreError> {
            Err(StoreError::StorageError("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_keyword_store_failure_fails_closed() {
        let service = SpamScoringService::new(BrokenKeywordStore, SpamScoringConfig::default());

        let result = service
            .analyze_content("BUY NOW!!!!!! http://a.io", Some("Deal"))
            .await;

        assert_eq!(result, SpamAnalysisResult::failed());
        assert_eq!(result.reason, "Analysis failed");
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_added_keywords_are_lowercased_and_used() {
        let service = SpamScoringService::new(MockKeywordStore::new(), SpamScoringConfig::default());

        let stored = service.add_keyword("  Casino ", None).await.unwrap();
        assert_eq!(stored.keyword, "casino");
        assert_eq!(stored.severity, DEFAULT_KEYWORD_SEVERITY);
        assert!(stored.is_active);

        let result = service.analyze_content("best casino in town", None).await;
        assert_eq!(result.flagged_keywords, vec!["casino".to_string()]);
    }

    #[tokio::test]
    async fn test_deactivated_keyword_stops_matching() {
        let service = SpamScoringService::new(MockKeywordStore::new(), SpamScoringConfig::default());
        let stored = service.add_keyword("casino", Some(4)).await.unwrap();

        service.update_keyword(stored.id, 4, false).await.unwrap();

        let result = service.analyze_content("best casino in town", None).await;
        assert!(result.flagged_keywords.is_empty());

        let all = service.list_keywords().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);
    }

    #[tokio::test]
    async fn test_keyword_validation() {
        let service = SpamScoringService::new(MockKeywordStore::new(), SpamScoringConfig::default());

        assert!(matches!(
            service.add_keyword("   ", None).await,
            Err(SpamError::InvalidKeyword(_))
        ));
        assert!(matches!(
            service.add_keyword("casino", Some(0)).await,
            Err(SpamError::InvalidKeyword(_))
        ));
        assert!(matches!(
            service.update_keyword(1, 11, true).await,
            Err(SpamError::InvalidKeyword(_))
        ));
        assert!(matches!(
            service.update_keyword(99, 2, true).await,
            Err(SpamError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_ml_seam_matches_rule_based_result() {
        let service = SpamScoringService::new(MockKeywordStore::new(), SpamScoringConfig::default());
        service.add_keyword("casino", Some(3)).await.unwrap();

        let text = "casino casino, click here";
        assert_eq!(
            service.analyze_with_ml_model(text, None).await,
            service.analyze_content(text, None).await
        );
    }
}
