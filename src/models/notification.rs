use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A message addressed to one investor. Only the read state ever changes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub investor_id: i64,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub link_url: String,
    pub related_user_id: Option<Uuid>,
    pub related_project_id: Option<i64>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const NOTIFICATION_COLUMNS: &str = "id, investor_id, notification_type, title, message, \
     link_url, related_user_id, related_project_id, is_read, read_at, created_at";

/// Fields of a notification about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewNotification<'a> {
    pub investor_id: i64,
    pub notification_type: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub link_url: &'a str,
    pub related_user_id: Option<Uuid>,
    pub related_project_id: Option<i64>,
}

impl Notification {
    pub async fn create(db_pool: &PgPool, new: NewNotification<'_>) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications
                (investor_id, notification_type, title, message, link_url,
                 related_user_id, related_project_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(new.investor_id)
        .bind(new.notification_type)
        .bind(new.title)
        .bind(new.message)
        .bind(new.link_url)
        .bind(new.related_user_id)
        .bind(new.related_project_id)
        .fetch_one(db_pool)
        .await
    }

    pub async fn count_for_investor(
        db_pool: &PgPool,
        investor_id: i64,
        unread_only: bool,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE investor_id = $1 AND (NOT $2 OR NOT is_read)",
        )
        .bind(investor_id)
        .bind(unread_only)
        .fetch_one(db_pool)
        .await
    }

    /// One page of an investor's notifications, newest first.
    pub async fn list_for_investor(
        db_pool: &PgPool,
        investor_id: i64,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE investor_id = $1 AND (NOT $2 OR NOT is_read) \
             ORDER BY id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(investor_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(db_pool)
        .await
    }

    /// Flips the read flag. `read_at` keeps the time of the first read.
    ///
    /// Returns `None` when the notification does not belong to the investor.
    pub async fn mark_read(
        db_pool: &PgPool,
        id: i64,
        investor_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND investor_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(investor_id)
        .fetch_optional(db_pool)
        .await
    }
}
