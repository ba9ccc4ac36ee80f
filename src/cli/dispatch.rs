// Runs one parsed command against a moderation service and returns the
// JSON document to print.

use super::args::{Command, KeywordCommand, PagingArgs};
use crate::core::moderation::{
    ApproveOptions, AuditStore, BulkActionRequest, ContentFilters, ContentQuery, DeleteOptions,
    HideOptions, KeywordStore, ModerationLogQuery, ModerationService, ModerationUser,
    RejectOptions, ReportStore, ReportedContentQuery, Role, SortField, SortOrder,
};
use anyhow::Result;
use serde_json::{json, Value};

pub async fn execute<R, A, K>(
    command: Command,
    service: &ModerationService<R, A, K>,
    user: &ModerationUser,
) -> Result<Value>
where
    R: ReportStore,
    A: AuditStore,
    K: KeywordStore,
{
    let output = match command {
        Command::Migrate => json!({ "migrated": true }),

        Command::Analyze { content, title, ml } => {
            let analysis = if ml {
                service
                    .analyze_with_ml_model(&content, title.as_deref())
                    .await
            } else {
                service.analyze_content(&content, title.as_deref()).await
            };
            serde_json::to_value(analysis)?
        }

        Command::Keywords { command } => match command {
            KeywordCommand::Add { keyword, severity } => {
                serde_json::to_value(service.add_spam_keyword(&keyword, severity).await?)?
            }
            KeywordCommand::Update {
                id,
                severity,
                inactive,
            } => {
                service.update_spam_keyword(id, severity, !inactive).await?;
                json!({ "id": id, "severity": severity, "isActive": !inactive })
            }
            KeywordCommand::List => serde_json::to_value(service.list_spam_keywords().await?)?,
        },

        Command::List(args) => {
            let (page, limit, sort_by, sort_order) = paging(&args.paging);
            let query = ContentQuery {
                content_types: args.content_types,
                filters: ContentFilters {
                    status: args.status,
                    author_id: args.author,
                    date_from: args.from,
                    date_to: args.to,
                },
                page,
                limit,
                sort_by,
                sort_order,
                ..Default::default()
            };
            serde_json::to_value(service.list_content(&query, user).await?)?
        }

        Command::Reported(args) => {
            let (page, limit, sort_by, sort_order) = paging(&args.paging);
            let query = ReportedContentQuery {
                content_type: args.content_type,
                min_report_count: args.min_reports,
                page,
                limit,
                sort_by,
                sort_order,
            };
            serde_json::to_value(service.list_reported_content(&query, user).await?)?
        }

        Command::Get { content_type, id } => {
            serde_json::to_value(service.get_content(content_type, &id, user).await?)?
        }

        Command::Approve {
            content_type,
            id,
            note,
        } => {
            let options = ApproveOptions { note };
            serde_json::to_value(
                service
                    .approve_content(content_type, &id, &options, user)
                    .await?,
            )?
        }

        Command::Reject {
            content_type,
            id,
            reason,
            notify,
        } => {
            let options = RejectOptions {
                reason,
                notify_author: notify,
            };
            serde_json::to_value(
                service
                    .reject_content(content_type, &id, &options, user)
                    .await?,
            )?
        }

        Command::Hide {
            content_type,
            id,
            reason,
            notify,
        } => {
            let options = HideOptions {
                reason,
                notify_author: notify,
            };
            serde_json::to_value(service.hide_content(content_type, &id, &options, user).await?)?
        }

        Command::Delete {
            content_type,
            id,
            reason,
            hard,
        } => {
            let options = DeleteOptions {
                reason,
                hard_delete: hard,
            };
            serde_json::to_value(
                service
                    .delete_content(content_type, &id, &options, user)
                    .await?,
            )?
        }

        Command::Bulk {
            action,
            items,
            reason,
            notify,
        } => {
            let request = BulkActionRequest {
                action,
                items,
                reason,
                notify_authors: notify,
            };
            serde_json::to_value(service.bulk_action(&request, user).await?)?
        }

        Command::AutoFlag {
            content_type,
            id,
            content,
            title,
        } => {
            let analysis = service.analyze_content(&content, title.as_deref()).await;
            service
                .auto_flag_spam(content_type, &id, &content, title.as_deref())
                .await;
            json!({
                "type": content_type,
                "id": id,
                "flagged": analysis.is_spam,
                "analysis": analysis,
            })
        }

        Command::History {
            target_type,
            target_id,
            moderator,
            limit,
        } => {
            let query = ModerationLogQuery {
                target_type,
                target_id,
                moderator_id: moderator,
                limit,
            };
            serde_json::to_value(service.moderation_history(&query, user).await?)?
        }
    };

    Ok(output)
}

type Paging = (Option<u32>, Option<u32>, Option<SortField>, Option<SortOrder>);

fn paging(args: &PagingArgs) -> Paging {
    (args.page, args.limit, args.sort_by, args.order)
}

pub fn acting_user(actor: &str, role: &str) -> ModerationUser {
    ModerationUser {
        id: actor.to_string(),
        role: Role::from(role),
        username: actor.to_string(),
    }
}
