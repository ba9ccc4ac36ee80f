// Moderation domain models - the unified view over articles, topics,
// replies and jobs, plus reports, audit entries and spam analysis results.
//
// These are pure domain types with no storage dependencies.
// The infra layer converts rows into these shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `flaggedBySystem` on a content item is derived from its stored spam score.
/// Kept separate from the scoring engine's configurable `spam_threshold`.
pub const FLAGGED_BY_SYSTEM_THRESHOLD: u8 = 75;

/// Maximum number of characters kept in a content preview.
pub const PREVIEW_LENGTH: usize = 200;

/// Actor id written to the audit log for automated decisions.
pub const SYSTEM_ACTOR_ID: &str = "system";

// ============================================================================
// CONTENT
// ============================================================================

/// The four moderatable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Topic,
    Reply,
    Job,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Article,
        ContentType::Topic,
        ContentType::Reply,
        ContentType::Job,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Topic => "topic",
            ContentType::Reply => "reply",
            ContentType::Job => "job",
        }
    }

    /// Articles and jobs persist an explicit status column.
    /// Topics and replies only persist `is_deleted`.
    pub fn has_status_column(&self) -> bool {
        matches!(self, ContentType::Article | ContentType::Job)
    }

    /// Only topics and replies carry a spam score column.
    pub fn supports_spam_score(&self) -> bool {
        matches!(self, ContentType::Topic | ContentType::Reply)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "article" => Ok(ContentType::Article),
            "topic" => Ok(ContentType::Topic),
            "reply" => Ok(ContentType::Reply),
            "job" => Ok(ContentType::Job),
            other => Err(format!("Unknown content type: {}", other)),
        }
    }
}

/// Moderation states. Articles and jobs store these verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Pending,
    Approved,
    Rejected,
    Hidden,
    Deleted,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Pending => "pending",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
            ContentStatus::Hidden => "hidden",
            ContentStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ContentStatus::Pending),
            "approved" => Ok(ContentStatus::Approved),
            "rejected" => Ok(ContentStatus::Rejected),
            "hidden" => Ok(ContentStatus::Hidden),
            "deleted" => Ok(ContentStatus::Deleted),
            other => Err(format!("Unknown content status: {}", other)),
        }
    }
}

/// Status labels reported for topics and replies, which have no status column.
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_DELETED: &str = "deleted";

/// Denormalized author shown next to a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAuthor {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Unified moderation view of a piece of content. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub title: Option<String>,
    /// Truncated preview, see [`preview`].
    pub content: String,
    pub author_id: String,
    pub author: Option<ContentAuthor>,
    pub status: String,
    pub spam_score: Option<u8>,
    pub report_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub flagged_by_system: bool,
}

/// Shorten a body to [`PREVIEW_LENGTH`] characters.
pub fn preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_LENGTH {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(PREVIEW_LENGTH).collect();
    cut.push_str("...");
    cut
}

pub fn is_flagged_by_system(spam_score: Option<u8>) -> bool {
    spam_score.is_some_and(|score| score > FLAGGED_BY_SYSTEM_THRESHOLD)
}

/// Filters every content adapter applies as a storage predicate.
#[derive(Debug, Clone, Default)]
pub struct ContentFilters {
    /// Matched against the unified `ContentItem::status` string.
    pub status: Option<String>,
    pub author_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

// ============================================================================
// USERS & ACTORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Moderator,
    User,
    Other(String),
}

impl Role {
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            "user" => Role::User,
            other => Role::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Moderator => f.write_str("moderator"),
            Role::User => f.write_str("user"),
            Role::Other(name) => f.write_str(name),
        }
    }
}

/// Already-authenticated caller, supplied per request.
#[derive(Debug, Clone)]
pub struct ModerationUser {
    pub id: String,
    pub role: Role,
    pub username: String,
}

/// Who made a moderation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Human(String),
    System,
}

impl Actor {
    /// Storage representation of the actor (`moderator_id` column).
    pub fn storage_id(&self) -> &str {
        match self {
            Actor::Human(id) => id,
            Actor::System => SYSTEM_ACTOR_ID,
        }
    }
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewing,
    ResolvedNoAction,
    ResolvedViolation,
    Dismissed,
}

impl ReportStatus {
    /// Statuses that still count towards `reportCount`.
    pub const OPEN: [ReportStatus; 2] = [ReportStatus::Pending, ReportStatus::Reviewing];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewing => "reviewing",
            ReportStatus::ResolvedNoAction => "resolved_no_action",
            ReportStatus::ResolvedViolation => "resolved_violation",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "reviewing" => Ok(ReportStatus::Reviewing),
            "resolved_no_action" => Ok(ReportStatus::ResolvedNoAction),
            "resolved_violation" => Ok(ReportStatus::ResolvedViolation),
            "dismissed" => Ok(ReportStatus::Dismissed),
            other => Err(format!("Unknown report status: {}", other)),
        }
    }
}

/// A user report against a piece of content. Created outside this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub reportable_type: ContentType,
    pub reportable_id: String,
    pub reason: String,
    pub status: ReportStatus,
    pub reporter_id: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

// ============================================================================
// AUDIT LOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    ApproveContent,
    RejectContent,
    HideContent,
    SoftDeleteContent,
    HardDeleteContent,
    AutoFlagSpam,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::ApproveContent => "approve_content",
            ModerationAction::RejectContent => "reject_content",
            ModerationAction::HideContent => "hide_content",
            ModerationAction::SoftDeleteContent => "soft_delete_content",
            ModerationAction::HardDeleteContent => "hard_delete_content",
            ModerationAction::AutoFlagSpam => "auto_flag_spam",
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve_content" => Ok(ModerationAction::ApproveContent),
            "reject_content" => Ok(ModerationAction::RejectContent),
            "hide_content" => Ok(ModerationAction::HideContent),
            "soft_delete_content" => Ok(ModerationAction::SoftDeleteContent),
            "hard_delete_content" => Ok(ModerationAction::HardDeleteContent),
            "auto_flag_spam" => Ok(ModerationAction::AutoFlagSpam),
            other => Err(format!("Unknown moderation action: {}", other)),
        }
    }
}

/// One append-only audit entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationLogEntry {
    pub actor: Actor,
    pub action: ModerationAction,
    pub target_type: ContentType,
    pub target_id: String,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// An audit entry as read back from storage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationLogRecord {
    pub id: String,
    pub moderator_id: String,
    pub action: ModerationAction,
    pub target_type: ContentType,
    pub target_id: String,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Filter for reading the audit log back.
#[derive(Debug, Clone, Default)]
pub struct ModerationLogQuery {
    pub target_type: Option<ContentType>,
    pub target_id: Option<String>,
    pub moderator_id: Option<String>,
    pub limit: Option<u32>,
}

// ============================================================================
// SPAM
// ============================================================================

/// Outcome of scoring one piece of text. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpamAnalysisResult {
    pub spam_score: u8,
    pub flagged_keywords: Vec<String>,
    pub is_spam: bool,
    pub reason: String,
    pub confidence: f64,
}

impl SpamAnalysisResult {
    /// Fail-closed result returned when analysis could not run.
    pub fn failed() -> Self {
        Self {
            spam_score: 0,
            flagged_keywords: Vec::new(),
            is_spam: false,
            reason: "Analysis failed".to_string(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpamKeyword {
    pub id: i64,
    pub keyword: String,
    pub severity: u8,
    pub is_active: bool,
}

// ============================================================================
// REQUESTS & RESPONSES
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ApproveOptions {
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RejectOptions {
    pub reason: String,
    pub notify_author: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HideOptions {
    pub reason: String,
    pub notify_author: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub reason: String,
    pub hard_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Approve,
    Reject,
    Hide,
    Delete,
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(BulkAction::Approve),
            "reject" => Ok(BulkAction::Reject),
            "hide" => Ok(BulkAction::Hide),
            "delete" => Ok(BulkAction::Delete),
            other => Err(format!("Unknown bulk action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct BulkActionRequest {
    pub action: BulkAction,
    pub items: Vec<BulkItem>,
    pub reason: Option<String>,
    pub notify_authors: bool,
}

/// `processed + failed == items.len()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkActionResult {
    pub success: bool,
    pub processed: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    ReportCount,
    SpamScore,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" => Ok(SortField::CreatedAt),
            "updatedAt" | "updated_at" => Ok(SortField::UpdatedAt),
            "reportCount" | "report_count" => Ok(SortField::ReportCount),
            "spamScore" | "spam_score" => Ok(SortField::SpamScore),
            other => Err(format!("Unknown sort field: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}

/// Query contract of `list_content`.
///
/// `reported`, `flagged_by_system` and `min_spam_score` are accepted but not
/// applied; see DESIGN.md.
#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    /// Empty means every content type.
    pub content_types: Vec<ContentType>,
    pub filters: ContentFilters,
    pub reported: Option<bool>,
    pub flagged_by_system: Option<bool>,
    pub min_spam_score: Option<u8>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

/// Query contract of `list_reported_content`.
#[derive(Debug, Clone, Default)]
pub struct ReportedContentQuery {
    pub content_type: Option<ContentType>,
    pub min_report_count: Option<u32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPage {
    pub items: Vec<ContentItem>,
    pub pagination: Pagination,
}
