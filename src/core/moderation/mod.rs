// Core moderation module - content listing, moderation decisions, report
// aggregation, audit logging and spam scoring.
// Storage lives behind the ports declared in each service file.

pub mod audit_service;
pub mod content_store;
pub mod moderation_models;
pub mod moderation_service;
pub mod report_service;
pub mod spam_scoring;
pub mod spam_service;

pub use audit_service::AuditStore;
pub use content_store::{ContentAdapter, ContentRegistry, StoreError};
pub use moderation_models::*;
pub use moderation_service::{AuthorNotifier, ModerationService};
pub use report_service::ReportStore;
pub use spam_scoring::SpamScoringConfig;
pub use spam_service::{KeywordStore, SpamScoringService};
