// Command line definition.

use crate::core::moderation::{BulkAction, BulkItem, ContentType, SortField, SortOrder};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "moderation",
    author,
    version,
    about = "Moderate articles, topics, replies and job posts."
)]
pub struct Cli {
    /// Use throwaway in-memory storage instead of DATABASE_URL.
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// Id of the acting user, recorded in the audit log.
    #[arg(long, global = true, default_value = "cli")]
    pub actor: String,

    /// Role of the acting user (admin, moderator, user).
    #[arg(long, global = true, default_value = "user")]
    pub role: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the moderation tables.
    Migrate,

    /// Score a piece of text without storing anything.
    Analyze {
        content: String,
        #[arg(long)]
        title: Option<String>,
        /// Use the classifier entry point.
        #[arg(long)]
        ml: bool,
    },

    /// Manage the spam keyword table.
    Keywords {
        #[command(subcommand)]
        command: KeywordCommand,
    },

    /// List content across types.
    List(ListArgs),

    /// List content with open reports.
    Reported(ReportedArgs),

    /// Show one content item.
    Get {
        content_type: ContentType,
        id: String,
    },

    /// Approve content and close its reports.
    Approve {
        content_type: ContentType,
        id: String,
        #[arg(long)]
        note: Option<String>,
    },

    /// Reject content.
    Reject {
        content_type: ContentType,
        id: String,
        #[arg(long)]
        reason: String,
        /// Tell the author.
        #[arg(long)]
        notify: bool,
    },

    /// Hide content. Reports stay open.
    Hide {
        content_type: ContentType,
        id: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        notify: bool,
    },

    /// Delete content (soft unless --hard).
    Delete {
        content_type: ContentType,
        id: String,
        #[arg(long)]
        reason: String,
        /// Remove the row for good. Admins only.
        #[arg(long)]
        hard: bool,
    },

    /// Apply one action to many items given as type:id.
    Bulk {
        action: BulkAction,
        #[arg(required = true, value_parser = parse_bulk_item)]
        items: Vec<BulkItem>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        notify: bool,
    },

    /// Score freshly created content and flag it if it is spam.
    AutoFlag {
        content_type: ContentType,
        id: String,
        content: String,
        #[arg(long)]
        title: Option<String>,
    },

    /// Read the moderation log, newest first.
    History {
        #[arg(long = "type")]
        target_type: Option<ContentType>,
        #[arg(long = "target")]
        target_id: Option<String>,
        #[arg(long)]
        moderator: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeywordCommand {
    /// Add a keyword, or re-activate an existing one.
    Add {
        keyword: String,
        #[arg(long)]
        severity: Option<u8>,
    },
    /// Change severity or active flag of a keyword.
    Update {
        id: i64,
        #[arg(long)]
        severity: u8,
        #[arg(long)]
        inactive: bool,
    },
    List,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Repeat to select several types. Default: all.
    #[arg(long = "type")]
    pub content_types: Vec<ContentType>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,
    #[arg(long)]
    pub to: Option<DateTime<Utc>>,
    #[command(flatten)]
    pub paging: PagingArgs,
}

#[derive(Args, Debug)]
pub struct ReportedArgs {
    #[arg(long = "type")]
    pub content_type: Option<ContentType>,
    #[arg(long)]
    pub min_reports: Option<u32>,
    #[command(flatten)]
    pub paging: PagingArgs,
}

#[derive(Args, Debug)]
pub struct PagingArgs {
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
    /// createdAt, updatedAt, reportCount or spamScore.
    #[arg(long)]
    pub sort_by: Option<SortField>,
    /// asc or desc.
    #[arg(long)]
    pub order: Option<SortOrder>,
}

/// `article:42` -> BulkItem.
pub fn parse_bulk_item(raw: &str) -> Result<BulkItem, String> {
    let (content_type, id) = raw
        .split_once(':')
        .ok_or_else(|| format!("Expected type:id, got '{}'", raw))?;
    if id.is_empty() {
        return Err(format!("Missing id in '{}'", raw));
    }
    Ok(BulkItem {
        content_type: content_type.parse()?,
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bulk_item() {
        assert_eq!(
            parse_bulk_item("topic:t-1").unwrap(),
            BulkItem {
                content_type: ContentType::Topic,
                id: "t-1".to_string(),
            }
        );
        assert!(parse_bulk_item("topic").is_err());
        assert!(parse_bulk_item("topic:").is_err());
        assert!(parse_bulk_item("comment:1").is_err());
    }

    #[test]
    fn test_cli_parses_moderation_commands() {
        let cli = Cli::parse_from([
            "moderation",
            "delete",
            "article",
            "a1",
            "--reason",
            "spam",
            "--hard",
            "--actor",
            "admin-1",
            "--role",
            "admin",
        ]);
        assert_eq!(cli.actor, "admin-1");
        assert_eq!(cli.role, "admin");
        match cli.command {
            Command::Delete {
                content_type,
                hard,
                ..
            } => {
                assert_eq!(content_type, ContentType::Article);
                assert!(hard);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from([
            "moderation",
            "bulk",
            "hide",
            "topic:t1",
            "reply:p2",
            "--reason",
            "noise",
        ]);
        match cli.command {
            Command::Bulk { action, items, .. } => {
                assert_eq!(action, BulkAction::Hide);
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from([
            "moderation",
            "list",
            "--type",
            "job",
            "--type",
            "article",
            "--sort-by",
            "reportCount",
            "--order",
            "asc",
        ]);
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.content_types, vec![ContentType::Job, ContentType::Article]);
                assert_eq!(args.paging.sort_by, Some(SortField::ReportCount));
                assert_eq!(args.paging.order, Some(SortOrder::Asc));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
