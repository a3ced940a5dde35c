//! # User Account
//!
//! Email-keyed account row. Which profile table references the user decides
//! its [`Role`]; the role is not stored on the account itself.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Which side of the marketplace an account registers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Startup,
    Investor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Startup => write!(f, "startup"),
            Role::Investor => write!(f, "investor"),
        }
    }
}

/// A row of the `users` table. `password_hash` is an Argon2 PHC string.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub(crate) const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, is_active, \
     is_staff, is_superuser, last_login, created_at, updated_at";

impl User {
    pub async fn find_by_id(db_pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db_pool)
            .await
    }

    /// Looks up by email. The caller passes an already-normalized address.
    pub async fn find_by_email(db_pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db_pool)
            .await
    }

    pub async fn role(&self, db_pool: &PgPool) -> Result<Option<Role>, sqlx::Error> {
        let row: (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM startup_profiles WHERE user_id = $1),
                EXISTS(SELECT 1 FROM investor_profiles WHERE user_id = $1)
            "#,
        )
        .bind(self.id)
        .fetch_one(db_pool)
        .await?;

        Ok(match row {
            (true, _) => Some(Role::Startup),
            (_, true) => Some(Role::Investor),
            _ => None,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
