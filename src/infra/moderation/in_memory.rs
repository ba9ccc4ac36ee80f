// In-memory implementations of the moderation ports.
//
// Every struct is a cheap handle over shared DashMaps, so a clone handed to
// the service and a clone kept by a test (or the CLI) see the same data.

use super::content_record::ContentRecord;
use crate::core::moderation::{
    AuditStore, ContentAdapter, ContentFilters, ContentItem, ContentStatus, ContentType,
    KeywordStore, ModerationLogEntry, ModerationLogQuery, ModerationLogRecord, Report,
    ReportStatus, ReportStore, SpamKeyword, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// CONTENT
// ============================================================================

/// Content rows of one type.
#[derive(Clone)]
pub struct InMemoryContentAdapter {
    content_type: ContentType,
    rows: Arc<DashMap<String, ContentRecord>>,
}

impl InMemoryContentAdapter {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            rows: Arc::new(DashMap::new()),
        }
    }

    /// Seed a row. Creating content is outside moderation.
    #[cfg(test)]
    pub fn insert(&self, record: ContentRecord) {
        self.rows.insert(record.id.clone(), record);
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<ContentRecord> {
        self.rows.get(id).map(|row| row.clone())
    }

    fn matches(&self, record: &ContentRecord, filters: &ContentFilters) -> bool {
        if let Some(status) = &filters.status {
            if record.to_item(self.content_type).status != *status {
                return false;
            }
        }
        if let Some(author_id) = &filters.author_id {
            if record.author.id != *author_id {
                return false;
            }
        }
        if filters.date_from.is_some_and(|from| record.created_at < from) {
            return false;
        }
        if filters.date_to.is_some_and(|to| record.created_at > to) {
            return false;
        }
        true
    }
}

#[async_trait]
impl ContentAdapter for InMemoryContentAdapter {
    fn content_type(&self) -> ContentType {
        self.content_type
    }

    async fn fetch_many(&self, filters: &ContentFilters) -> Result<Vec<ContentItem>, StoreError> {
        let mut rows: Vec<ContentRecord> = self
            .rows
            .iter()
            .filter(|row| self.matches(row.value(), filters))
            .map(|row| row.clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(rows
            .iter()
            .map(|row| row.to_item(self.content_type))
            .collect())
    }

    async fn fetch_one(&self, id: &str) -> Result<Option<ContentItem>, StoreError> {
        Ok(self.rows.get(id).map(|row| row.to_item(self.content_type)))
    }

    async fn set_status(&self, id: &str, status: ContentStatus) -> Result<(), StoreError> {
        let mut row = self
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(self.content_type, id))?;

        if self.content_type.has_status_column() {
            row.status = status;
            row.updated_at = Utc::now();
        } else if status == ContentStatus::Deleted {
            row.is_deleted = true;
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn hard_delete(&self, id: &str) -> Result<(), StoreError> {
        self.rows
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(self.content_type, id))
    }

    async fn set_spam_score(&self, id: &str, score: u8) -> Result<(), StoreError> {
        if !self.content_type.supports_spam_score() {
            return Ok(());
        }
        let mut row = self
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(self.content_type, id))?;
        row.spam_score = Some(score);
        Ok(())
    }
}

// ============================================================================
// REPORTS, KEYWORDS, AUDIT LOG
// ============================================================================

#[derive(Default)]
struct Tables {
    reports: DashMap<String, Report>,
    keywords: DashMap<i64, SpamKeyword>,
    next_keyword_id: AtomicI64,
    logs: DashMap<u64, ModerationLogRecord>,
    next_log_seq: AtomicU64,
}

/// Reports, spam keywords and the audit log in one handle.
#[derive(Clone, Default)]
pub struct InMemoryModerationStore {
    tables: Arc<Tables>,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a report. Filing reports is outside moderation.
    #[cfg(test)]
    pub fn insert_report(&self, report: Report) {
        self.tables.reports.insert(report.id.clone(), report);
    }

    pub fn reports(&self) -> Vec<Report> {
        let mut all: Vec<Report> = self.tables.reports.iter().map(|r| r.clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Audit log in insertion order.
    pub fn log_entries(&self) -> Vec<ModerationLogRecord> {
        let mut entries: Vec<(u64, ModerationLogRecord)> = self
            .tables
            .logs
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, record)| record).collect()
    }

    fn sorted_keywords(&self) -> Vec<SpamKeyword> {
        let mut all: Vec<SpamKeyword> = self.tables.keywords.iter().map(|k| k.clone()).collect();
        all.sort_by_key(|k| k.id);
        all
    }
}

#[async_trait]
impl ReportStore for InMemoryModerationStore {
    async fn count_open_reports(
        &self,
        content_type: ContentType,
        ids: &[String],
    ) -> Result<HashMap<String, u32>, StoreError> {
        let mut counts = HashMap::new();
        for report in self.tables.reports.iter() {
            if report.reportable_type == content_type
                && report.status.is_open()
                && ids.contains(&report.reportable_id)
            {
                *counts.entry(report.reportable_id.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn list_open_reports(
        &self,
        content_type: Option<ContentType>,
    ) -> Result<Vec<Report>, StoreError> {
        Ok(self
            .reports()
            .into_iter()
            .filter(|r| r.status.is_open())
            .filter(|r| content_type.map_or(true, |t| r.reportable_type == t))
            .collect())
    }

    async fn resolve_open_reports(
        &self,
        content_type: ContentType,
        id: &str,
        resolution: ReportStatus,
        resolved_by: &str,
        resolved_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut changed = 0;
        for mut report in self.tables.reports.iter_mut() {
            if report.reportable_type == content_type
                && report.reportable_id == id
                && report.status.is_open()
            {
                report.status = resolution;
                report.resolved_by = Some(resolved_by.to_string());
                report.resolved_at = Some(resolved_at);
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl KeywordStore for InMemoryModerationStore {
    async fn active_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError> {
        Ok(self
            .sorted_keywords()
            .into_iter()
            .filter(|k| k.is_active)
            .collect())
    }

    async fn list_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError> {
        Ok(self.sorted_keywords())
    }

    async fn add_keyword(&self, keyword: &str, severity: u8) -> Result<SpamKeyword, StoreError> {
        if let Some(mut existing) = self
            .tables
            .keywords
            .iter_mut()
            .find(|k| k.keyword == keyword)
        {
            existing.severity = severity;
            existing.is_active = true;
            return Ok(existing.clone());
        }

        let id = self.tables.next_keyword_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = SpamKeyword {
            id,
            keyword: keyword.to_string(),
            severity,
            is_active: true,
        };
        self.tables.keywords.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_keyword(
        &self,
        id: i64,
        severity: u8,
        is_active: bool,
    ) -> Result<(), StoreError> {
        let mut keyword = self
            .tables
            .keywords
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("keyword", id))?;
        keyword.severity = severity;
        keyword.is_active = is_active;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for InMemoryModerationStore {
    async fn append(&self, entry: &ModerationLogEntry) -> Result<(), StoreError> {
        let seq = self.tables.next_log_seq.fetch_add(1, Ordering::SeqCst);
        self.tables.logs.insert(
            seq,
            ModerationLogRecord {
                id: uuid::Uuid::new_v4().to_string(),
                moderator_id: entry.actor.storage_id().to_string(),
                action: entry.action,
                target_type: entry.target_type,
                target_id: entry.target_id.clone(),
                reason: entry.reason.clone(),
                metadata: entry.metadata.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn query(
        &self,
        query: &ModerationLogQuery,
    ) -> Result<Vec<ModerationLogRecord>, StoreError> {
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(self
            .log_entries()
            .into_iter()
            .rev()
            .filter(|r| query.target_type.map_or(true, |t| r.target_type == t))
            .filter(|r| query.target_id.as_ref().map_or(true, |id| &r.target_id == id))
            .filter(|r| {
                query
                    .moderator_id
                    .as_ref()
                    .map_or(true, |m| &r.moderator_id == m)
            })
            .take(limit)
            .collect())
    }
}
