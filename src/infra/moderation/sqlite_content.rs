// SQLite content adapters - one per content type.
//
// Tables:
// - articles: explicit status column, author_id -> users
// - jobs: explicit status column, company_id -> companies.user_id -> users
// - topics / replies: is_deleted flag plus spam_score, author_id -> users

use super::content_record::{format_timestamp, parse_timestamp, ContentRecord};
use crate::core::moderation::{
    ContentAdapter, ContentAuthor, ContentFilters, ContentItem, ContentStatus, ContentType,
    StoreError, STATUS_ACTIVE, STATUS_DELETED,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

pub(crate) fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::StorageError(e.to_string())
}

/// Where one content type lives and how to read it as a `ContentRecord`.
struct ContentTable {
    content_type: ContentType,
    table: &'static str,
    alias: &'static str,
    select: &'static str,
}

const ARTICLES: ContentTable = ContentTable {
    content_type: ContentType::Article,
    table: "articles",
    alias: "a",
    select: r#"
        SELECT a.id, a.title, a.body, a.status, NULL AS is_deleted, NULL AS spam_score,
               a.created_at, a.updated_at,
               u.id AS author_id, u.username AS author_username, u.email AS author_email
        FROM articles a
        JOIN users u ON u.id = a.author_id
    "#,
};

const JOBS: ContentTable = ContentTable {
    content_type: ContentType::Job,
    table: "jobs",
    alias: "j",
    select: r#"
        SELECT j.id, j.title, j.description AS body, j.status, NULL AS is_deleted,
               NULL AS spam_score, j.created_at, j.updated_at,
               u.id AS author_id, u.username AS author_username, u.email AS author_email
        FROM jobs j
        JOIN companies c ON c.id = j.company_id
        JOIN users u ON u.id = c.user_id
    "#,
};

const TOPICS: ContentTable = ContentTable {
    content_type: ContentType::Topic,
    table: "topics",
    alias: "t",
    select: r#"
        SELECT t.id, t.title, t.body, NULL AS status, t.is_deleted, t.spam_score,
               t.created_at, t.updated_at,
               u.id AS author_id, u.username AS author_username, u.email AS author_email
        FROM topics t
        JOIN users u ON u.id = t.author_id
    "#,
};

const REPLIES: ContentTable = ContentTable {
    content_type: ContentType::Reply,
    table: "replies",
    alias: "r",
    select: r#"
        SELECT r.id, NULL AS title, r.body, NULL AS status, r.is_deleted, r.spam_score,
               r.created_at, r.updated_at,
               u.id AS author_id, u.username AS author_username, u.email AS author_email
        FROM replies r
        JOIN users u ON u.id = r.author_id
    "#,
};

// ============================================================================
// SHARED QUERIES
// ============================================================================

async fn select_items(
    pool: &Pool<Sqlite>,
    source: &ContentTable,
    filters: &ContentFilters,
    id: Option<&str>,
) -> Result<Vec<ContentItem>, StoreError> {
    let alias = source.alias;
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(source.select);
    query.push(" WHERE 1 = 1");

    if let Some(id) = id {
        query.push(format!(" AND {}.id = ", alias));
        query.push_bind(id.to_string());
    }

    if let Some(status) = &filters.status {
        if source.content_type.has_status_column() {
            query.push(format!(" AND {}.status = ", alias));
            query.push_bind(status.clone());
        } else if status == STATUS_DELETED {
            query.push(format!(" AND {}.is_deleted = 1", alias));
        } else if status == STATUS_ACTIVE {
            query.push(format!(" AND {}.is_deleted = 0", alias));
        } else {
            // no other status exists for this type
            query.push(" AND 1 = 0");
        }
    }

    if let Some(author_id) = &filters.author_id {
        query.push(" AND u.id = ");
        query.push_bind(author_id.clone());
    }
    if let Some(from) = filters.date_from {
        query.push(format!(" AND {}.created_at >= ", alias));
        query.push_bind(format_timestamp(from));
    }
    if let Some(to) = filters.date_to {
        query.push(format!(" AND {}.created_at <= ", alias));
        query.push_bind(format_timestamp(to));
    }

    query.push(format!(" ORDER BY {0}.created_at DESC, {0}.id DESC", alias));

    let rows = query.build().fetch_all(pool).await.map_err(db_error)?;
    rows.iter()
        .map(|row| record_from_row(row).map(|record| record.to_item(source.content_type)))
        .collect()
}

fn record_from_row(row: &SqliteRow) -> Result<ContentRecord, StoreError> {
    let status: Option<String> = row.try_get("status").map_err(db_error)?;
    let status = match status {
        Some(raw) => raw.parse::<ContentStatus>().map_err(StoreError::StorageError)?,
        None => ContentStatus::Pending,
    };
    let is_deleted: Option<bool> = row.try_get("is_deleted").map_err(db_error)?;
    let spam_score: Option<i64> = row.try_get("spam_score").map_err(db_error)?;
    let created_at: String = row.try_get("created_at").map_err(db_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(db_error)?;

    Ok(ContentRecord {
        id: row.try_get("id").map_err(db_error)?,
        title: row.try_get("title").map_err(db_error)?,
        body: row.try_get("body").map_err(db_error)?,
        author: ContentAuthor {
            id: row.try_get("author_id").map_err(db_error)?,
            username: row.try_get("author_username").map_err(db_error)?,
            email: row.try_get("author_email").map_err(db_error)?,
        },
        status,
        is_deleted: is_deleted.unwrap_or(false),
        spam_score: spam_score.map(|s| s.clamp(0, 100) as u8),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

async fn fetch_single(
    pool: &Pool<Sqlite>,
    source: &ContentTable,
    id: &str,
) -> Result<Option<ContentItem>, StoreError> {
    let mut items = select_items(pool, source, &ContentFilters::default(), Some(id)).await?;
    Ok(items.pop())
}

async fn update_status_column(
    pool: &Pool<Sqlite>,
    source: &ContentTable,
    id: &str,
    status: ContentStatus,
) -> Result<(), StoreError> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET status = ?, updated_at = ? WHERE id = ?",
        source.table
    ))
    .bind(status.as_str())
    .bind(format_timestamp(Utc::now()))
    .bind(id)
    .execute(pool)
    .await
    .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(source.content_type, id));
    }
    Ok(())
}

/// Topics and replies: only `Deleted` is persisted.
async fn update_deleted_flag(
    pool: &Pool<Sqlite>,
    source: &ContentTable,
    id: &str,
    status: ContentStatus,
) -> Result<(), StoreError> {
    if status == ContentStatus::Deleted {
        let result = sqlx::query(&format!(
            "UPDATE {} SET is_deleted = 1, updated_at = ? WHERE id = ?",
            source.table
        ))
        .bind(format_timestamp(Utc::now()))
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(source.content_type, id));
        }
        return Ok(());
    }

    let exists = sqlx::query(&format!("SELECT 1 FROM {} WHERE id = ?", source.table))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)?;
    if exists.is_none() {
        return Err(StoreError::not_found(source.content_type, id));
    }
    Ok(())
}

async fn delete_row(pool: &Pool<Sqlite>, source: &ContentTable, id: &str) -> Result<(), StoreError> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", source.table))
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(source.content_type, id));
    }
    Ok(())
}

async fn update_spam_score(
    pool: &Pool<Sqlite>,
    source: &ContentTable,
    id: &str,
    score: u8,
) -> Result<(), StoreError> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET spam_score = ? WHERE id = ?",
        source.table
    ))
    .bind(score as i64)
    .bind(id)
    .execute(pool)
    .await
    .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(source.content_type, id));
    }
    Ok(())
}

// ============================================================================
// ARTICLES
// ============================================================================

pub struct SqliteArticleAdapter {
    pool: Pool<Sqlite>,
}

impl SqliteArticleAdapter {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentAdapter for SqliteArticleAdapter {
    fn content_type(&self) -> ContentType {
        ContentType::Article
    }

    async fn fetch_many(&self, filters: &ContentFilters) -> Result<Vec<ContentItem>, StoreError> {
        select_items(&self.pool, &ARTICLES, filters, None).await
    }

    async fn fetch_one(&self, id: &str) -> Result<Option<ContentItem>, StoreError> {
        fetch_single(&self.pool, &ARTICLES, id).await
    }

    async fn set_status(&self, id: &str, status: ContentStatus) -> Result<(), StoreError> {
        update_status_column(&self.pool, &ARTICLES, id, status).await
    }

    async fn hard_delete(&self, id: &str) -> Result<(), StoreError> {
        delete_row(&self.pool, &ARTICLES, id).await
    }

    async fn set_spam_score(&self, _id: &str, _score: u8) -> Result<(), StoreError> {
        // articles have no spam score column
        Ok(())
    }
}

// ============================================================================
// JOBS
// ============================================================================

pub struct SqliteJobAdapter {
    pool: Pool<Sqlite>,
}

impl SqliteJobAdapter {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentAdapter for SqliteJobAdapter {
    fn content_type(&self) -> ContentType {
        ContentType::Job
    }

    async fn fetch_many(&self, filters: &ContentFilters) -> Result<Vec<ContentItem>, StoreError> {
        select_items(&self.pool, &JOBS, filters, None).await
    }

    async fn fetch_one(&self, id: &str) -> Result<Option<ContentItem>, StoreError> {
        fetch_single(&self.pool, &JOBS, id).await
    }

    async fn set_status(&self, id: &str, status: ContentStatus) -> Result<(), StoreError> {
        update_status_column(&self.pool, &JOBS, id, status).await
    }

    async fn hard_delete(&self, id: &str) -> Result<(), StoreError> {
        delete_row(&self.pool, &JOBS, id).await
    }

    async fn set_spam_score(&self, _id: &str, _score: u8) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// TOPICS
// ============================================================================

pub struct SqliteTopicAdapter {
    pool: Pool<Sqlite>,
}

impl SqliteTopicAdapter {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentAdapter for SqliteTopicAdapter {
    fn content_type(&self) -> ContentType {
        ContentType::Topic
    }

    async fn fetch_many(&self, filters: &ContentFilters) -> Result<Vec<ContentItem>, StoreError> {
        select_items(&self.pool, &TOPICS, filters, None).await
    }

    async fn fetch_one(&self, id: &str) -> Result<Option<ContentItem>, StoreError> {
        fetch_single(&self.pool, &TOPICS, id).await
    }

    /// Approve, reject and hide leave the row as it is.
    async fn set_status(&self, id: &str, status: ContentStatus) -> Result<(), StoreError> {
        update_deleted_flag(&self.pool, &TOPICS, id, status).await
    }

    async fn hard_delete(&self, id: &str) -> Result<(), StoreError> {
        delete_row(&self.pool, &TOPICS, id).await
    }

    async fn set_spam_score(&self, id: &str, score: u8) -> Result<(), StoreError> {
        update_spam_score(&self.pool, &TOPICS, id, score).await
    }
}

// ============================================================================
// REPLIES
// ============================================================================

pub struct SqliteReplyAdapter {
    pool: Pool<Sqlite>,
}

impl SqliteReplyAdapter {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentAdapter for SqliteReplyAdapter {
    fn content_type(&self) -> ContentType {
        ContentType::Reply
    }

    async fn fetch_many(&self, filters: &ContentFilters) -> Result<Vec<ContentItem>, StoreError> {
        select_items(&self.pool, &REPLIES, filters, None).await
    }

    async fn fetch_one(&self, id: &str) -> Result<Option<ContentItem>, StoreError> {
        fetch_single(&self.pool, &REPLIES, id).await
    }

    /// Approve, reject and hide leave the row as it is.
    async fn set_status(&self, id: &str, status: ContentStatus) -> Result<(), StoreError> {
        update_deleted_flag(&self.pool, &REPLIES, id, status).await
    }

    async fn hard_delete(&self, id: &str) -> Result<(), StoreError> {
        delete_row(&self.pool, &REPLIES, id).await
    }

    async fn set_spam_score(&self, id: &str, score: u8) -> Result<(), StoreError> {
        update_spam_score(&self.pool, &REPLIES, id, score).await
    }
}
