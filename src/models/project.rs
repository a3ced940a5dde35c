use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::utils::text::split_tags;

/// Lifecycle of a fundraising project.
///
/// Corresponds to the PostgreSQL `project_status` enum type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "project_visibility", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectVisibility {
    #[default]
    Public,
    Private,
}

/// A project owned by exactly one startup profile.
///
/// `tags` is stored comma-separated and serialized as a list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: i64,
    pub startup_id: i64,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub description: String,
    pub status: ProjectStatus,
    pub target_amount: Decimal,
    pub raised_amount: Decimal,
    pub currency: String,
    #[serde(serialize_with = "serialize_tags")]
    pub tags: String,
    pub visibility: ProjectVisibility,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn serialize_tags<S: Serializer>(tags: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(split_tags(tags))
}

pub(crate) const PROJECT_COLUMNS: &str = "id, startup_id, title, slug, short_description, \
     description, status, target_amount, raised_amount, currency, tags, \
     visibility, created_at, updated_at";

impl Project {
    pub async fn find_by_slug(db_pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(db_pool)
        .await
    }

    pub async fn count_for_startup(db_pool: &PgPool, startup_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE startup_id = $1")
            .bind(startup_id)
            .fetch_one(db_pool)
            .await
    }

    /// One page of a startup's projects, ordered by id.
    pub async fn list_for_startup(
        db_pool: &PgPool,
        startup_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE startup_id = $1 \
             ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(startup_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db_pool)
        .await
    }

    pub async fn create(db_pool: &PgPool, new: NewProject<'_>) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects
                (startup_id, title, slug, short_description, description, status,
                 target_amount, raised_amount, currency, tags, visibility)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(new.startup_id)
        .bind(new.title)
        .bind(new.slug)
        .bind(new.short_description)
        .bind(new.description)
        .bind(new.status)
        .bind(new.target_amount)
        .bind(new.raised_amount)
        .bind(new.currency)
        .bind(new.tags)
        .bind(new.visibility)
        .fetch_one(db_pool)
        .await
    }
}

/// Fields of a project about to be created. `tags` is already comma-joined.
#[derive(Debug, Clone)]
pub struct NewProject<'a> {
    pub startup_id: i64,
    pub title: &'a str,
    pub slug: &'a str,
    pub short_description: &'a str,
    pub description: &'a str,
    pub status: ProjectStatus,
    pub target_amount: Decimal,
    pub raised_amount: Decimal,
    pub currency: &'a str,
    pub tags: &'a str,
    pub visibility: ProjectVisibility,
}
