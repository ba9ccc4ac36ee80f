// Moderation action service - the entry point for every moderation decision.
//
// This service handles:
// - Permission checks (admin/moderator, admin-only hard delete)
// - Listing content across the four content types, and reported content
// - Approve / reject / hide / delete with audit trail and report resolution
// - Bulk actions with per-item failure accounting
// - Automatic spam flagging on the content creation path
//
// Storage-agnostic: everything it touches goes through the ports in
// `content_store`, `report_service`, `audit_service` and `spam_service`.

use super::audit_service::{AuditService, AuditStore, SideEffect};
use super::content_store::{ContentRegistry, StoreError};
use super::moderation_models::{
    ActionResponse, Actor, ApproveOptions, BulkAction, BulkActionRequest, BulkActionResult,
    ContentItem, ContentPage, ContentQuery, ContentStatus, ContentType, DeleteOptions,
    HideOptions, ModerationAction, ModerationLogEntry, ModerationLogQuery, ModerationLogRecord,
    ModerationUser, Pagination, RejectOptions, ReportStatus, ReportedContentQuery,
    SortField, SortOrder, SpamAnalysisResult, SpamKeyword,
};
use super::report_service::{ReportService, ReportStore};
use super::spam_service::{KeywordStore, SpamError, SpamScoringService};
use async_trait::async_trait;
use futures_util::future::join_all;
use thiserror::Error;

pub const PERMISSION_DENIED_MESSAGE: &str =
    "Access denied: moderation actions are restricted to administrators and moderators";
pub const HARD_DELETE_DENIED_MESSAGE: &str =
    "Access denied: only administrators can permanently delete content";
pub const REASON_REQUIRED_MESSAGE: &str = "A reason is required for this action";

pub const MAX_BULK_ITEMS: usize = 100;
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("{0}")]
    PermissionDenied(String),

    #[error("Content not found")]
    NotFound { content_type: String, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Map a storage failure to the caller-facing error. Anything other than a
/// missing row is logged and replaced with `message`.
fn wrap_store_error(error: StoreError, message: &str) -> ModerationError {
    match error {
        StoreError::NotFound { content_type, id } => ModerationError::NotFound { content_type, id },
        other => {
            tracing::error!("{}: {}", message, other);
            ModerationError::OperationFailed(message.to_string())
        }
    }
}

fn wrap_spam_error(error: SpamError, message: &str) -> ModerationError {
    match error {
        SpamError::InvalidKeyword(msg) => ModerationError::Validation(msg),
        SpamError::Store(store) => wrap_store_error(store, message),
    }
}

// ============================================================================
// NOTIFICATION PORT
// ============================================================================

/// Tells an author that their content was moderated.
#[async_trait]
pub trait AuthorNotifier: Send + Sync {
    async fn notify_author(
        &self,
        content_type: ContentType,
        id: &str,
        action: ModerationAction,
        reason: &str,
    ) -> anyhow::Result<()>;
}

// ============================================================================
// PERMISSION GUARD
// ============================================================================

pub fn verify_moderator(user: &ModerationUser) -> Result<(), ModerationError> {
    if user.role.can_moderate() {
        Ok(())
    } else {
        Err(ModerationError::PermissionDenied(
            PERMISSION_DENIED_MESSAGE.to_string(),
        ))
    }
}

pub fn verify_admin(user: &ModerationUser) -> Result<(), ModerationError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(ModerationError::PermissionDenied(
            HARD_DELETE_DENIED_MESSAGE.to_string(),
        ))
    }
}

fn require_reason(reason: &str) -> Result<&str, ModerationError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        Err(ModerationError::Validation(
            REASON_REQUIRED_MESSAGE.to_string(),
        ))
    } else {
        Ok(trimmed)
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Side effects that follow a successful state change.
struct Decision<'a> {
    content_type: ContentType,
    id: &'a str,
    action: ModerationAction,
    reason: Option<String>,
    resolution: Option<ReportStatus>,
    notify: bool,
}

pub struct ModerationService<R: ReportStore, A: AuditStore, K: KeywordStore> {
    content: ContentRegistry,
    reports: ReportService<R>,
    audit: AuditService<A>,
    spam: SpamScoringService<K>,
    notifier: Box<dyn AuthorNotifier>,
}

impl<R: ReportStore, A: AuditStore, K: KeywordStore> ModerationService<R, A, K> {
    pub fn new(
        content: ContentRegistry,
        report_store: R,
        audit_store: A,
        spam: SpamScoringService<K>,
        notifier: Box<dyn AuthorNotifier>,
    ) -> Self {
        Self {
            content,
            reports: ReportService::new(report_store),
            audit: AuditService::new(audit_store),
            spam,
            notifier,
        }
    }

    // ------------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------------

    /// List content across the requested types (all types when none given).
    pub async fn list_content(
        &self,
        query: &ContentQuery,
        user: &ModerationUser,
    ) -> Result<ContentPage, ModerationError> {
        verify_moderator(user)?;

        if query.reported.is_some()
            || query.flagged_by_system.is_some()
            || query.min_spam_score.is_some()
        {
            tracing::debug!(
                reported = ?query.reported,
                flagged_by_system = ?query.flagged_by_system,
                min_spam_score = ?query.min_spam_score,
                "Ignoring filters that are not applied by the content adapters"
            );
        }

        let mut types: Vec<ContentType> = if query.content_types.is_empty() {
            ContentType::ALL.to_vec()
        } else {
            query.content_types.clone()
        };
        types.sort();
        types.dedup();

        // Independent reads, one per type.
        let fetched = join_all(
            types
                .iter()
                .map(|t| self.content.fetch_many(*t, &query.filters)),
        )
        .await;

        let mut items = Vec::new();
        for (content_type, result) in types.iter().zip(fetched) {
            let mut batch = result.map_err(|e| wrap_store_error(e, "Failed to fetch content"))?;
            self.attach_report_counts(*content_type, &mut batch).await?;
            items.extend(batch);
        }

        sort_items(
            &mut items,
            query.sort_by.unwrap_or(SortField::CreatedAt),
            query.sort_order.unwrap_or_default(),
        );
        Ok(paginate(items, query.page, query.limit))
    }

    /// List content that has open reports, with `report_count` set from the
    /// report groups. Items that cannot be fetched are skipped.
    pub async fn list_reported_content(
        &self,
        query: &ReportedContentQuery,
        user: &ModerationUser,
    ) -> Result<ContentPage, ModerationError> {
        verify_moderator(user)?;

        let groups = self
            .reports
            .group_open_reports(query.content_type, query.min_report_count)
            .await
            .map_err(|e| wrap_store_error(e, "Failed to fetch reported content"))?;

        let mut items = Vec::with_capacity(groups.len());
        for group in groups {
            match self
                .content
                .fetch_one(group.content_type, &group.content_id)
                .await
            {
                Ok(Some(mut item)) => {
                    item.report_count = group.report_count;
                    items.push(item);
                }
                Ok(None) => {
                    tracing::warn!(
                        content_type = %group.content_type,
                        id = %group.content_id,
                        "Reported content no longer exists, skipping"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        content_type = %group.content_type,
                        id = %group.content_id,
                        "Failed to fetch reported content, skipping: {}",
                        e
                    );
                }
            }
        }

        sort_items(
            &mut items,
            query.sort_by.unwrap_or(SortField::ReportCount),
            query.sort_order.unwrap_or_default(),
        );
        Ok(paginate(items, query.page, query.limit))
    }

    /// Fetch one item with its open report count.
    pub async fn get_content(
        &self,
        content_type: ContentType,
        id: &str,
        user: &ModerationUser,
    ) -> Result<ContentItem, ModerationError> {
        verify_moderator(user)?;

        let item = self
            .content
            .fetch_one(content_type, id)
            .await
            .map_err(|e| wrap_store_error(e, "Failed to fetch content"))?;
        let mut items = vec![item.ok_or_else(|| ModerationError::NotFound {
            content_type: content_type.to_string(),
            id: id.to_string(),
        })?];
        self.attach_report_counts(content_type, &mut items).await?;
        Ok(items.remove(0))
    }

    async fn attach_report_counts(
        &self,
        content_type: ContentType,
        items: &mut [ContentItem],
    ) -> Result<(), ModerationError> {
        let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        let counts = self
            .reports
            .get_report_counts(content_type, &ids)
            .await
            .map_err(|e| wrap_store_error(e, "Failed to fetch report counts"))?;
        for item in items.iter_mut() {
            item.report_count = counts.get(&item.id).copied().unwrap_or(0);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Single-item decisions
    // ------------------------------------------------------------------------

    pub async fn approve_content(
        &self,
        content_type: ContentType,
        id: &str,
        options: &ApproveOptions,
        user: &ModerationUser,
    ) -> Result<ActionResponse, ModerationError> {
        verify_moderator(user)?;

        self.content
            .set_status(content_type, id, ContentStatus::Approved)
            .await
            .map_err(|e| wrap_store_error(e, "Failed to approve content"))?;

        self.finish_decision(
            user,
            Decision {
                content_type,
                id,
                action: ModerationAction::ApproveContent,
                reason: options.note.clone(),
                resolution: Some(ReportStatus::ResolvedNoAction),
                notify: false,
            },
        )
        .await;

        Ok(ActionResponse::ok("Content approved successfully"))
    }

    pub async fn reject_content(
        &self,
        content_type: ContentType,
        id: &str,
        options: &RejectOptions,
        user: &ModerationUser,
    ) -> Result<ActionResponse, ModerationError> {
        verify_moderator(user)?;
        let reason = require_reason(&options.reason)?;

        self.content
            .set_status(content_type, id, ContentStatus::Rejected)
            .await
            .map_err(|e| wrap_store_error(e, "Failed to reject content"))?;

        self.finish_decision(
            user,
            Decision {
                content_type,
                id,
                action: ModerationAction::RejectContent,
                reason: Some(reason.to_string()),
                resolution: Some(ReportStatus::ResolvedViolation),
                notify: options.notify_author,
            },
        )
        .await;

        Ok(ActionResponse::ok("Content rejected successfully"))
    }

    /// Hide content. Open reports are left untouched.
    pub async fn hide_content(
        &self,
        content_type: ContentType,
        id: &str,
        options: &HideOptions,
        user: &ModerationUser,
    ) -> Result<ActionResponse, ModerationError> {
        verify_moderator(user)?;
        let reason = require_reason(&options.reason)?;

        self.content
            .set_status(content_type, id, ContentStatus::Hidden)
            .await
            .map_err(|e| wrap_store_error(e, "Failed to hide content"))?;

        self.finish_decision(
            user,
            Decision {
                content_type,
                id,
                action: ModerationAction::HideContent,
                reason: Some(reason.to_string()),
                resolution: None,
                notify: options.notify_author,
            },
        )
        .await;

        Ok(ActionResponse::ok("Content hidden successfully"))
    }

    /// Soft delete, or with `hard_delete` remove the row (admins only).
    pub async fn delete_content(
        &self,
        content_type: ContentType,
        id: &str,
        options: &DeleteOptions,
        user: &ModerationUser,
    ) -> Result<ActionResponse, ModerationError> {
        if options.hard_delete {
            verify_admin(user)?;
        }
        verify_moderator(user)?;
        let reason = require_reason(&options.reason)?;

        let (action, message) = if options.hard_delete {
            self.content
                .hard_delete(content_type, id)
                .await
                .map_err(|e| wrap_store_error(e, "Failed to delete content"))?;
            (
                ModerationAction::HardDeleteContent,
                "Content permanently deleted",
            )
        } else {
            self.content
                .set_status(content_type, id, ContentStatus::Deleted)
                .await
                .map_err(|e| wrap_store_error(e, "Failed to delete content"))?;
            (
                ModerationAction::SoftDeleteContent,
                "Content deleted successfully",
            )
        };

        self.finish_decision(
            user,
            Decision {
                content_type,
                id,
                action,
                reason: Some(reason.to_string()),
                resolution: Some(ReportStatus::ResolvedViolation),
                notify: false,
            },
        )
        .await;

        Ok(ActionResponse::ok(message))
    }

    /// Audit, resolve reports and notify. None of these can fail the decision.
    async fn finish_decision(&self, user: &ModerationUser, decision: Decision<'_>) {
        let audited = self
            .audit
            .record(ModerationLogEntry {
                actor: Actor::Human(user.id.clone()),
                action: decision.action,
                target_type: decision.content_type,
                target_id: decision.id.to_string(),
                reason: decision.reason.clone(),
                metadata: None,
            })
            .await;

        let resolved = match decision.resolution {
            Some(resolution) => {
                self.reports
                    .resolve(decision.content_type, decision.id, resolution, &user.id)
                    .await
            }
            None => SideEffect::Skipped,
        };

        let notified = if decision.notify {
            self.notify(
                decision.content_type,
                decision.id,
                decision.action,
                decision.reason.as_deref().unwrap_or_default(),
            )
            .await
        } else {
            SideEffect::Skipped
        };

        let degraded = audited.is_failed() || resolved.is_failed() || notified.is_failed();
        tracing::info!(
            moderator = %user.id,
            action = %decision.action,
            content_type = %decision.content_type,
            id = decision.id,
            degraded,
            audited = ?audited,
            reports = ?resolved,
            notified = ?notified,
            "Moderation decision applied"
        );
    }

    async fn notify(
        &self,
        content_type: ContentType,
        id: &str,
        action: ModerationAction,
        reason: &str,
    ) -> SideEffect {
        match self
            .notifier
            .notify_author(content_type, id, action, reason)
            .await
        {
            Ok(()) => SideEffect::Completed,
            Err(e) => {
                tracing::warn!(
                    content_type = %content_type,
                    id,
                    "Failed to notify author: {}",
                    e
                );
                SideEffect::Failed(e.to_string())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------------

    /// Apply one action to many items, in order. A failing item is recorded
    /// and the batch carries on.
    pub async fn bulk_action(
        &self,
        request: &BulkActionRequest,
        user: &ModerationUser,
    ) -> Result<BulkActionResult, ModerationError> {
        verify_moderator(user)?;

        if request.items.is_empty() || request.items.len() > MAX_BULK_ITEMS {
            return Err(ModerationError::Validation(format!(
                "Bulk actions accept between 1 and {} items",
                MAX_BULK_ITEMS
            )));
        }

        let reason = request.reason.clone().unwrap_or_default();
        let mut processed = 0;
        let mut errors = Vec::new();

        for item in &request.items {
            let outcome = match request.action {
                BulkAction::Approve => {
                    let options = ApproveOptions {
                        note: request.reason.clone(),
                    };
                    self.approve_content(item.content_type, &item.id, &options, user)
                        .await
                }
                BulkAction::Reject => {
                    let options = RejectOptions {
                        reason: reason.clone(),
                        notify_author: request.notify_authors,
                    };
                    self.reject_content(item.content_type, &item.id, &options, user)
                        .await
                }
                BulkAction::Hide => {
                    let options = HideOptions {
                        reason: reason.clone(),
                        notify_author: request.notify_authors,
                    };
                    self.hide_content(item.content_type, &item.id, &options, user)
                        .await
                }
                BulkAction::Delete => {
                    let options = DeleteOptions {
                        reason: reason.clone(),
                        hard_delete: false,
                    };
                    self.delete_content(item.content_type, &item.id, &options, user)
                        .await
                }
            };

            match outcome {
                Ok(_) => processed += 1,
                Err(e) => errors.push(format!("{}:{} - {}", item.content_type, item.id, e)),
            }
        }

        let failed = errors.len();
        Ok(BulkActionResult {
            success: failed == 0,
            processed,
            failed,
            errors,
        })
    }

    // ------------------------------------------------------------------------
    // Spam
    // ------------------------------------------------------------------------

    /// Score freshly created content and flag it when it looks like spam.
    /// Runs on the authoring path, so nothing here may fail the caller.
    pub async fn auto_flag_spam(
        &self,
        content_type: ContentType,
        id: &str,
        content: &str,
        title: Option<&str>,
    ) {
        let analysis = self.spam.analyze_content(content, title).await;
        if !analysis.is_spam {
            return;
        }

        if let Err(e) = self
            .content
            .set_spam_score(content_type, id, analysis.spam_score)
            .await
        {
            tracing::warn!(
                content_type = %content_type,
                id,
                "Auto-flag could not store spam score: {}",
                e
            );
            return;
        }

        let metadata = serde_json::json!({
            "spamScore": analysis.spam_score,
            "flaggedKeywords": analysis.flagged_keywords,
            "confidence": analysis.confidence,
        });
        let audited = self
            .audit
            .record(ModerationLogEntry {
                actor: Actor::System,
                action: ModerationAction::AutoFlagSpam,
                target_type: content_type,
                target_id: id.to_string(),
                reason: Some(analysis.reason.clone()),
                metadata: Some(metadata),
            })
            .await;

        tracing::info!(
            content_type = %content_type,
            id,
            spam_score = analysis.spam_score,
            audited = ?audited,
            "Content auto-flagged as spam"
        );
    }

    pub async fn analyze_content(&self, content: &str, title: Option<&str>) -> SpamAnalysisResult {
        self.spam.analyze_content(content, title).await
    }

    pub async fn analyze_with_ml_model(
        &self,
        content: &str,
        title: Option<&str>,
    ) -> SpamAnalysisResult {
        self.spam.analyze_with_ml_model(content, title).await
    }

    pub async fn add_spam_keyword(
        &self,
        keyword: &str,
        severity: Option<u8>,
    ) -> Result<SpamKeyword, ModerationError> {
        self.spam
            .add_keyword(keyword, severity)
            .await
            .map_err(|e| wrap_spam_error(e, "Failed to add spam keyword"))
    }

    pub async fn update_spam_keyword(
        &self,
        id: i64,
        severity: u8,
        is_active: bool,
    ) -> Result<(), ModerationError> {
        self.spam
            .update_keyword(id, severity, is_active)
            .await
            .map_err(|e| wrap_spam_error(e, "Failed to update spam keyword"))
    }

    pub async fn list_spam_keywords(&self) -> Result<Vec<SpamKeyword>, ModerationError> {
        self.spam
            .list_keywords()
            .await
            .map_err(|e| wrap_spam_error(e, "Failed to fetch spam keywords"))
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub async fn moderation_history(
        &self,
        query: &ModerationLogQuery,
        user: &ModerationUser,
    ) -> Result<Vec<ModerationLogRecord>, ModerationError> {
        verify_moderator(user)?;
        self.audit
            .history(query)
            .await
            .map_err(|e| wrap_store_error(e, "Failed to fetch moderation history"))
    }
}

// ============================================================================
// SORTING & PAGINATION
// ============================================================================

fn sort_items(items: &mut [ContentItem], field: SortField, order: SortOrder) {
    items.sort_by(|a, b| {
        let primary = match field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::ReportCount => a.report_count.cmp(&b.report_count),
            SortField::SpamScore => a.spam_score.unwrap_or(0).cmp(&b.spam_score.unwrap_or(0)),
        };
        let ordering = primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn paginate(items: Vec<ContentItem>, page: Option<u32>, limit: Option<u32>) -> ContentPage {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let total = items.len();
    let total_pages = total.div_ceil(limit as usize) as u32;
    let skip = (page as usize - 1).saturating_mul(limit as usize);

    ContentPage {
        items: items.into_iter().skip(skip).take(limit as usize).collect(),
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
