//! # Startup and Investor Profiles
//!
//! One-to-one extensions of [`User`](super::User), created in the same
//! transaction as the account during registration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Moderation state of a profile.
///
/// Corresponds to the PostgreSQL `audit_status` enum type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "audit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Closed set of regions an investor can operate in.
///
/// Corresponds to the PostgreSQL `region` enum type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "region", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Cherkasy,
    Chernihiv,
    Chernivtsi,
    Dnipropetrovsk,
    Donetsk,
    IvanoFrankivsk,
    Kherson,
    Kharkiv,
    #[default]
    Kyiv,
    Kirovohrad,
    Lviv,
    Mykolaiv,
    Odesa,
    Poltava,
    Rivne,
    Sumy,
    Ternopil,
    Vinnytsia,
    Volyn,
    Zaporizhzhia,
    Zhytomyr,
    Zakarpattia,
    Luhansk,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StartupProfile {
    pub id: i64,
    pub user_id: Uuid,
    pub company_name: String,
    pub description: String,
    pub founded_year: Option<i32>,
    pub team_size: Option<i32>,
    pub website: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub address: String,
    pub postal_code: String,
    pub logo: String,
    pub partners_brands: String,
    pub audit_status: AuditStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const STARTUP_COLUMNS: &str = "id, user_id, company_name, description, founded_year, team_size, \
     website, email, phone, city, address, postal_code, logo, partners_brands, audit_status, \
     created_at, updated_at";

impl StartupProfile {
    pub async fn find_by_id(db_pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, StartupProfile>(&format!(
            "SELECT {STARTUP_COLUMNS} FROM startup_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db_pool)
        .await
    }

    pub async fn find_by_user(db_pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, StartupProfile>(&format!(
            "SELECT {STARTUP_COLUMNS} FROM startup_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
    }

    /// Number of investors that bookmarked this startup.
    pub async fn followers_count(db_pool: &PgPool, id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM saved_startups WHERE startup_id = $1")
            .bind(id)
            .fetch_one(db_pool)
            .await
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvestorProfile {
    pub id: i64,
    pub user_id: Uuid,
    pub company_name: String,
    pub full_name: String,
    pub description: String,
    pub investment_range_min: Decimal,
    pub investment_range_max: Option<Decimal>,
    pub preferred_industries: String,
    pub website: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub region: Region,
    pub city: String,
    pub address: String,
    pub postal_code: String,
    pub logo: String,
    pub partners_brands: String,
    pub audit_status: AuditStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl InvestorProfile {
    pub async fn find_by_user(db_pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InvestorProfile>(
            r#"
            SELECT id, user_id, company_name, full_name, description, investment_range_min,
                   investment_range_max, preferred_industries, website, email, phone, country,
                   region, city, address, postal_code, logo, partners_brands, audit_status,
                   created_at, updated_at
            FROM investor_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
    }

    /// Id of the investor profile owned by `user_id`, if any.
    pub async fn id_for_user(db_pool: &PgPool, user_id: Uuid) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM investor_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db_pool)
            .await
    }
}

/// An investor's bookmark of a startup, with free-text notes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SavedStartup {
    pub id: i64,
    pub investor_id: i64,
    pub startup_id: i64,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SavedStartup {
    /// Bookmarks a startup for an investor. Saving twice only replaces the notes.
    pub async fn save(
        db_pool: &PgPool,
        investor_id: i64,
        startup_id: i64,
        notes: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SavedStartup>(
            r#"
            INSERT INTO saved_startups (investor_id, startup_id, notes)
            VALUES ($1, $2, $3)
            ON CONFLICT (investor_id, startup_id) DO UPDATE SET notes = EXCLUDED.notes
            RETURNING id, investor_id, startup_id, notes, created_at
            "#,
        )
        .bind(investor_id)
        .bind(startup_id)
        .bind(notes)
        .fetch_one(db_pool)
        .await
    }
}
