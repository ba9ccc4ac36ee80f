// Report aggregation - counts and groups open reports per content item and
// resolves them once a moderation decision lands.

use super::audit_service::SideEffect;
use super::content_store::StoreError;
use super::moderation_models::{ContentType, Report, ReportStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Open (pending/reviewing) report counts for the given ids.
    /// Ids without open reports may be missing from the map.
    async fn count_open_reports(
        &self,
        content_type: ContentType,
        ids: &[String],
    ) -> Result<HashMap<String, u32>, StoreError>;

    /// Every open report, oldest first, optionally limited to one type.
    async fn list_open_reports(
        &self,
        content_type: Option<ContentType>,
    ) -> Result<Vec<Report>, StoreError>;

    /// Move every open report against the item to `resolution`.
    /// Returns how many reports changed.
    async fn resolve_open_reports(
        &self,
        content_type: ContentType,
        id: &str,
        resolution: ReportStatus,
        resolved_by: &str,
        resolved_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}

/// Open reports grouped by their target.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportGroup {
    pub content_type: ContentType,
    pub content_id: String,
    pub report_count: u32,
    pub latest_report_at: DateTime<Utc>,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ReportService<R: ReportStore> {
    store: R,
}

impl<R: ReportStore> ReportService<R> {
    pub fn new(store: R) -> Self {
        Self { store }
    }

    /// Map of id -> open report count. Every requested id is present.
    pub async fn get_report_counts(
        &self,
        content_type: ContentType,
        ids: &[String],
    ) -> Result<HashMap<String, u32>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut counts = self.store.count_open_reports(content_type, ids).await?;
        for id in ids {
            counts.entry(id.clone()).or_insert(0);
        }
        Ok(counts)
    }

    /// Group open reports by target, in order of first report.
    pub async fn group_open_reports(
        &self,
        content_type: Option<ContentType>,
        min_report_count: Option<u32>,
    ) -> Result<Vec<ReportGroup>, StoreError> {
        let reports = self.store.list_open_reports(content_type).await?;

        let mut groups: Vec<ReportGroup> = Vec::new();
        let mut index: HashMap<(ContentType, String), usize> = HashMap::new();

        for report in reports.into_iter().filter(|r| r.status.is_open()) {
            let key = (report.reportable_type, report.reportable_id.clone());
            match index.get(&key) {
                Some(&i) => {
                    let group = &mut groups[i];
                    group.report_count += 1;
                    group.latest_report_at = group.latest_report_at.max(report.created_at);
                }
                None => {
                    index.insert(key, groups.len());
                    groups.push(ReportGroup {
                        content_type: report.reportable_type,
                        content_id: report.reportable_id,
                        report_count: 1,
                        latest_report_at: report.created_at,
                    });
                }
            }
        }

        if let Some(min) = min_report_count {
            groups.retain(|g| g.report_count >= min);
        }

        Ok(groups)
    }

    /// Resolve open reports against an item. Failures are logged and swallowed.
    pub async fn resolve(
        &self,
        content_type: ContentType,
        id: &str,
        resolution: ReportStatus,
        resolved_by: &str,
    ) -> SideEffect {
        match self
            .store
            .resolve_open_reports(content_type, id, resolution, resolved_by, Utc::now())
            .await
        {
            Ok(resolved) => {
                if resolved > 0 {
                    tracing::debug!(
                        content_type = %content_type,
                        id,
                        resolved,
                        resolution = resolution.as_str(),
                        "Resolved reports"
                    );
                }
                SideEffect::Completed
            }
            Err(e) => {
                tracing::warn!(
                    content_type = %content_type,
                    id,
                    "Failed to resolve reports: {}",
                    e
                );
                SideEffect::Failed(e.to_string())
            }
        }
    }
}
