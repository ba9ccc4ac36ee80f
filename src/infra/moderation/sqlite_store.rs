// SQLite-backed moderation storage.
//
// Tables:
// - users / companies: authors, and the company owners behind job posts
// - articles / jobs / topics / replies: moderated content
// - reports: user reports against content
// - spam_keywords: keyword table of the spam scorer
// - moderation_logs: append-only audit trail

#[cfg(test)]
use super::content_record::ContentRecord;
use super::content_record::{format_timestamp, parse_timestamp};
use super::sqlite_content::{
    db_error, SqliteArticleAdapter, SqliteJobAdapter, SqliteReplyAdapter, SqliteTopicAdapter,
};
use crate::core::moderation::{
    AuditStore, ContentRegistry, ContentType, KeywordStore, ModerationAction, ModerationLogEntry,
    ModerationLogQuery, ModerationLogRecord, Report, ReportStatus, ReportStore, SpamKeyword,
    StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::collections::HashMap;
use std::path::Path;

const OPEN_REPORT_STATUSES: &str = "('pending', 'reviewing')";

// ============================================================================
// DATABASE
// ============================================================================

pub struct SqliteModerationDb {
    pool: Pool<Sqlite>,
}

impl SqliteModerationDb {
    /// Open (creating the file if needed) and migrate.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let path_str = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user'
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                author_id TEXT NOT NULL REFERENCES users(id),
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_articles_created ON articles(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                company_id TEXT NOT NULL REFERENCES companies(id),
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_jobs_created ON jobs(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS topics (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                author_id TEXT NOT NULL REFERENCES users(id),
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                spam_score INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_topics_created ON topics(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS replies (
                id TEXT PRIMARY KEY,
                topic_id TEXT NOT NULL,
                body TEXT NOT NULL,
                author_id TEXT NOT NULL REFERENCES users(id),
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                spam_score INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_replies_created ON replies(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                reportable_type TEXT NOT NULL,
                reportable_id TEXT NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                reporter_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                resolved_at TEXT,
                resolved_by TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_reports_target
                ON reports(reportable_type, reportable_id, status);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS spam_keywords (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                keyword TEXT NOT NULL UNIQUE,
                severity INTEGER NOT NULL DEFAULT 1,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_logs (
                id TEXT PRIMARY KEY,
                moderator_id TEXT NOT NULL,
                action TEXT NOT NULL,
                target_type TEXT NOT NULL,
                target_id TEXT NOT NULL,
                reason TEXT,
                metadata TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_moderation_logs_target
                ON moderation_logs(target_type, target_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adapters for all four content types over this pool.
    pub fn content_registry(&self) -> ContentRegistry {
        ContentRegistry::new(
            Box::new(SqliteArticleAdapter::new(self.pool.clone())),
            Box::new(SqliteTopicAdapter::new(self.pool.clone())),
            Box::new(SqliteReplyAdapter::new(self.pool.clone())),
            Box::new(SqliteJobAdapter::new(self.pool.clone())),
        )
    }

    pub fn report_store(&self) -> SqliteReportStore {
        SqliteReportStore::new(self.pool.clone())
    }

    pub fn keyword_store(&self) -> SqliteKeywordStore {
        SqliteKeywordStore::new(self.pool.clone())
    }

    pub fn audit_store(&self) -> SqliteAuditStore {
        SqliteAuditStore::new(self.pool.clone())
    }
}

// Seeding and test access. Content and reports are created outside moderation.
#[cfg(test)]
impl SqliteModerationDb {
    /// Private in-memory database. One connection, so every query sees the
    /// same data.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn insert_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        role: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, role)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn insert_author(&self, record: &ContentRecord) -> Result<(), StoreError> {
        self.insert_user(
            &record.author.id,
            &record.author.username,
            &record.author.email,
            "user",
        )
        .await
    }

    pub async fn insert_article(&self, record: &ContentRecord) -> Result<(), StoreError> {
        self.insert_author(record).await?;
        sqlx::query(
            r#"
            INSERT INTO articles (id, title, body, author_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(record.title.clone().unwrap_or_default())
        .bind(&record.body)
        .bind(&record.author.id)
        .bind(record.status.as_str())
        .bind(format_timestamp(record.created_at))
        .bind(format_timestamp(record.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    /// Insert a job posted by `company_id`. The record's author becomes the
    /// company owner if the company does not exist yet.
    pub async fn insert_job(
        &self,
        record: &ContentRecord,
        company_id: &str,
    ) -> Result<(), StoreError> {
        self.insert_author(record).await?;
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, user_id)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(company_id)
        .bind(company_id)
        .bind(&record.author.id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO jobs (id, title, description, company_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(record.title.clone().unwrap_or_default())
        .bind(&record.body)
        .bind(company_id)
        .bind(record.status.as_str())
        .bind(format_timestamp(record.created_at))
        .bind(format_timestamp(record.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_topic(&self, record: &ContentRecord) -> Result<(), StoreError> {
        self.insert_author(record).await?;
        sqlx::query(
            r#"
            INSERT INTO topics (id, title, body, author_id, is_deleted, spam_score, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(record.title.clone().unwrap_or_default())
        .bind(&record.body)
        .bind(&record.author.id)
        .bind(record.is_deleted)
        .bind(record.spam_score.map(|s| s as i64))
        .bind(format_timestamp(record.created_at))
        .bind(format_timestamp(record.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_reply(
        &self,
        record: &ContentRecord,
        topic_id: &str,
    ) -> Result<(), StoreError> {
        self.insert_author(record).await?;
        sqlx::query(
            r#"
            INSERT INTO replies (id, topic_id, body, author_id, is_deleted, spam_score, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(topic_id)
        .bind(&record.body)
        .bind(&record.author.id)
        .bind(record.is_deleted)
        .bind(record.spam_score.map(|s| s as i64))
        .bind(format_timestamp(record.created_at))
        .bind(format_timestamp(record.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_report(&self, report: &Report) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reports (id, reportable_type, reportable_id, reason, status, reporter_id,
                                 created_at, resolved_at, resolved_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(report.reportable_type.as_str())
        .bind(&report.reportable_id)
        .bind(&report.reason)
        .bind(report.status.as_str())
        .bind(&report.reporter_id)
        .bind(format_timestamp(report.created_at))
        .bind(report.resolved_at.map(format_timestamp))
        .bind(&report.resolved_by)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}

fn parse_column<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T, StoreError> {
    raw.parse::<T>().map_err(StoreError::StorageError)
}

// ============================================================================
// REPORTS
// ============================================================================

pub struct SqliteReportStore {
    pool: Pool<Sqlite>,
}

impl SqliteReportStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn report_from_row(row: &SqliteRow) -> Result<Report, StoreError> {
    let reportable_type: String = row.try_get("reportable_type").map_err(db_error)?;
    let status: String = row.try_get("status").map_err(db_error)?;
    let created_at: String = row.try_get("created_at").map_err(db_error)?;
    let resolved_at: Option<String> = row.try_get("resolved_at").map_err(db_error)?;

    Ok(Report {
        id: row.try_get("id").map_err(db_error)?,
        reportable_type: parse_column(&reportable_type)?,
        reportable_id: row.try_get("reportable_id").map_err(db_error)?,
        reason: row.try_get("reason").map_err(db_error)?,
        status: parse_column(&status)?,
        reporter_id: row.try_get("reporter_id").map_err(db_error)?,
        created_at: parse_timestamp(&created_at)?,
        resolved_at: resolved_at.as_deref().map(parse_timestamp).transpose()?,
        resolved_by: row.try_get("resolved_by").map_err(db_error)?,
    })
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn count_open_reports(
        &self,
        content_type: ContentType,
        ids: &[String],
    ) -> Result<HashMap<String, u32>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT reportable_id, COUNT(*) AS report_count FROM reports \
             WHERE status IN {} AND reportable_type = ",
            OPEN_REPORT_STATUSES
        ));
        query.push_bind(content_type.as_str());
        query.push(" AND reportable_id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(") GROUP BY reportable_id");

        let rows = query.build().fetch_all(&self.pool).await.map_err(db_error)?;

        let mut counts = HashMap::new();
        for row in rows {
            let id: String = row.try_get("reportable_id").map_err(db_error)?;
            let count: i64 = row.try_get("report_count").map_err(db_error)?;
            counts.insert(id, count as u32);
        }
        Ok(counts)
    }

    async fn list_open_reports(
        &self,
        content_type: Option<ContentType>,
    ) -> Result<Vec<Report>, StoreError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT * FROM reports WHERE status IN {}",
            OPEN_REPORT_STATUSES
        ));
        if let Some(content_type) = content_type {
            query.push(" AND reportable_type = ");
            query.push_bind(content_type.as_str());
        }
        query.push(" ORDER BY created_at ASC, id ASC");

        let rows = query.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(report_from_row).collect()
    }

    async fn resolve_open_reports(
        &self,
        content_type: ContentType,
        id: &str,
        resolution: ReportStatus,
        resolved_by: &str,
        resolved_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE reports
            SET status = ?, resolved_by = ?, resolved_at = ?
            WHERE reportable_type = ? AND reportable_id = ? AND status IN {}
            "#,
            OPEN_REPORT_STATUSES
        ))
        .bind(resolution.as_str())
        .bind(resolved_by)
        .bind(format_timestamp(resolved_at))
        .bind(content_type.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// SPAM KEYWORDS
// ============================================================================

pub struct SqliteKeywordStore {
    pool: Pool<Sqlite>,
}

impl SqliteKeywordStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn keyword_from_row(row: &SqliteRow) -> Result<SpamKeyword, StoreError> {
    let severity: i64 = row.try_get("severity").map_err(db_error)?;
    Ok(SpamKeyword {
        id: row.try_get("id").map_err(db_error)?,
        keyword: row.try_get("keyword").map_err(db_error)?,
        severity: severity.clamp(0, u8::MAX as i64) as u8,
        is_active: row.try_get("is_active").map_err(db_error)?,
    })
}

#[async_trait]
impl KeywordStore for SqliteKeywordStore {
    async fn active_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, keyword, severity, is_active FROM spam_keywords WHERE is_active = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(keyword_from_row).collect()
    }

    async fn list_keywords(&self) -> Result<Vec<SpamKeyword>, StoreError> {
        let rows = sqlx::query("SELECT id, keyword, severity, is_active FROM spam_keywords ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(keyword_from_row).collect()
    }

    async fn add_keyword(&self, keyword: &str, severity: u8) -> Result<SpamKeyword, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO spam_keywords (keyword, severity, is_active, created_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(keyword) DO UPDATE SET
                severity = excluded.severity,
                is_active = 1
            "#,
        )
        .bind(keyword)
        .bind(severity as i64)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let row = sqlx::query(
            "SELECT id, keyword, severity, is_active FROM spam_keywords WHERE keyword = ?",
        )
        .bind(keyword)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        keyword_from_row(&row)
    }

    async fn update_keyword(
        &self,
        id: i64,
        severity: u8,
        is_active: bool,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE spam_keywords SET severity = ?, is_active = ? WHERE id = ?")
                .bind(severity as i64)
                .bind(is_active)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("keyword", id));
        }
        Ok(())
    }
}

// ============================================================================
// AUDIT LOG
// ============================================================================

pub struct SqliteAuditStore {
    pool: Pool<Sqlite>,
}

impl SqliteAuditStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn log_record_from_row(row: &SqliteRow) -> Result<ModerationLogRecord, StoreError> {
    let action: String = row.try_get("action").map_err(db_error)?;
    let target_type: String = row.try_get("target_type").map_err(db_error)?;
    let metadata: Option<String> = row.try_get("metadata").map_err(db_error)?;
    let created_at: String = row.try_get("created_at").map_err(db_error)?;

    let metadata = metadata
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| StoreError::StorageError(format!("Invalid log metadata: {}", e)))?;

    Ok(ModerationLogRecord {
        id: row.try_get("id").map_err(db_error)?,
        moderator_id: row.try_get("moderator_id").map_err(db_error)?,
        action: parse_column::<ModerationAction>(&action)?,
        target_type: parse_column(&target_type)?,
        target_id: row.try_get("target_id").map_err(db_error)?,
        reason: row.try_get("reason").map_err(db_error)?,
        metadata,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(&self, entry: &ModerationLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO moderation_logs
                (id, moderator_id, action, target_type, target_id, reason, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(entry.actor.storage_id())
        .bind(entry.action.as_str())
        .bind(entry.target_type.as_str())
        .bind(&entry.target_id)
        .bind(&entry.reason)
        .bind(entry.metadata.as_ref().map(|m| m.to_string()))
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn query(
        &self,
        query: &ModerationLogQuery,
    ) -> Result<Vec<ModerationLogRecord>, StoreError> {
        let mut sql: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM moderation_logs WHERE 1 = 1");
        if let Some(target_type) = query.target_type {
            sql.push(" AND target_type = ");
            sql.push_bind(target_type.as_str());
        }
        if let Some(target_id) = &query.target_id {
            sql.push(" AND target_id = ");
            sql.push_bind(target_id.clone());
        }
        if let Some(moderator_id) = &query.moderator_id {
            sql.push(" AND moderator_id = ");
            sql.push_bind(moderator_id.clone());
        }
        sql.push(" ORDER BY created_at DESC, rowid DESC");
        if let Some(limit) = query.limit {
            sql.push(" LIMIT ");
            sql.push_bind(limit as i64);
        }

        let rows = sql.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(log_record_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{Actor, ContentAuthor, ContentStatus};
    use chrono::Duration;
    use tempfile::TempDir;

    fn report(id: &str, t: ContentType, target: &str, age_mins: i64) -> Report {
        Report {
            id: id.to_string(),
            reportable_type: t,
            reportable_id: target.to_string(),
            reason: "spam".to_string(),
            status: ReportStatus::Pending,
            reporter_id: "reporter-1".to_string(),
            created_at: Utc::now() - Duration::minutes(age_mins),
            resolved_at: None,
            resolved_by: None,
        }
    }

    #[tokio::test]
    async fn test_report_counts_and_resolution() {
        let db = SqliteModerationDb::in_memory().await.unwrap();
        db.insert_report(&report("r1", ContentType::Topic, "t1", 30))
            .await
            .unwrap();
        db.insert_report(&report("r2", ContentType::Topic, "t1", 20))
            .await
            .unwrap();
        db.insert_report(&report("r3", ContentType::Article, "t1", 10))
            .await
            .unwrap();
        let store = db.report_store();

        let counts = store
            .count_open_reports(ContentType::Topic, &["t1".to_string(), "t9".to_string()])
            .await
            .unwrap();
        assert_eq!(counts.get("t1"), Some(&2));
        assert_eq!(counts.get("t9"), None);

        let changed = store
            .resolve_open_reports(
                ContentType::Topic,
                "t1",
                ReportStatus::ResolvedViolation,
                "mod-1",
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(changed, 2);

        let open = store.list_open_reports(None).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].reportable_type, ContentType::Article);

        let topics_open = store
            .list_open_reports(Some(ContentType::Topic))
            .await
            .unwrap();
        assert!(topics_open.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_table() {
        let db = SqliteModerationDb::in_memory().await.unwrap();
        let store = db.keyword_store();

        let casino = store.add_keyword("casino", 3).await.unwrap();
        store.add_keyword("pills", 2).await.unwrap();
        store.update_keyword(casino.id, 3, false).await.unwrap();

        let active = store.active_keywords().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].keyword, "pills");

        let again = store.add_keyword("casino", 7).await.unwrap();
        assert_eq!(again.id, casino.id);
        assert_eq!(again.severity, 7);
        assert!(again.is_active);

        let all = store.list_keywords().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].keyword, "casino");

        assert!(matches!(
            store.update_keyword(404, 1, true).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_audit_log_round_trip() {
        let db = SqliteModerationDb::in_memory().await.unwrap();
        let store = db.audit_store();

        store
            .append(&ModerationLogEntry {
                actor: Actor::Human("mod-1".to_string()),
                action: ModerationAction::HideContent,
                target_type: ContentType::Reply,
                target_id: "p1".to_string(),
                reason: Some("off topic".to_string()),
                metadata: None,
            })
            .await
            .unwrap();
        store
            .append(&ModerationLogEntry {
                actor: Actor::System,
                action: ModerationAction::AutoFlagSpam,
                target_type: ContentType::Topic,
                target_id: "t1".to_string(),
                reason: Some("Flagged keywords: casino".to_string()),
                metadata: Some(serde_json::json!({ "spamScore": 88 })),
            })
            .await
            .unwrap();

        let all = store.query(&ModerationLogQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].moderator_id, "system");
        assert_eq!(all[0].metadata.as_ref().unwrap()["spamScore"], 88);
        assert_eq!(all[1].action, ModerationAction::HideContent);

        let by_mod = store
            .query(&ModerationLogQuery {
                moderator_id: Some("mod-1".to_string()),
                limit: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_mod.len(), 1);
        assert_eq!(by_mod[0].target_id, "p1");
    }

    #[tokio::test]
    async fn test_file_database_persists_between_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("moderation.db");
        let url = format!("sqlite://{}", path.display());

        let db = SqliteModerationDb::connect(&url).await.unwrap();
        let now = Utc::now();
        db.insert_topic(&ContentRecord {
            id: "t1".to_string(),
            title: Some("Hello".to_string()),
            body: "First post".to_string(),
            author: ContentAuthor {
                id: "u1".to_string(),
                username: "ann".to_string(),
                email: "ann@example.com".to_string(),
            },
            status: ContentStatus::Pending,
            is_deleted: false,
            spam_score: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
        db.pool().close().await;

        let reopened = SqliteModerationDb::connect(&url).await.unwrap();
        let registry = reopened.content_registry();
        let item = registry
            .fetch_one(ContentType::Topic, "t1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.title.as_deref(), Some("Hello"));
        assert_eq!(item.status, "active");
    }
}
