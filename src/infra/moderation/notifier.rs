// Author notification stub. Delivery (mail, in-app) lives elsewhere; this
// adapter only records that a notification was due.

use crate::core::moderation::{AuthorNotifier, ContentType, ModerationAction};
use async_trait::async_trait;

#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl AuthorNotifier for LogNotifier {
    async fn notify_author(
        &self,
        content_type: ContentType,
        id: &str,
        action: ModerationAction,
        reason: &str,
    ) -> anyhow::Result<()> {
        tracing::info!(
            content_type = %content_type,
            id,
            action = %action,
            reason,
            "Author notification queued"
        );
        Ok(())
    }
}
