//! # Account Registration
//!
//! Validates a sign-up payload and creates the inactive account together with
//! its role profile in one transaction.
//!
//! Registering an email that already exists is not reported to the caller:
//! [`register`] returns [`RegistrationOutcome::Duplicate`] and the handler
//! answers exactly as it would for a fresh account.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};
use validator::Validate;

use crate::error::{AppError, FieldErrors};
use crate::models::{Region, Role, User, USER_COLUMNS};
use crate::services::password::hash_password_blocking;
use crate::utils::validator::{
    Expected, Lenient, check_money, normalize_email, resolve_optional, validate_optional_url,
    validate_password_not_similar, validate_password_strength,
};

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegistrationRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: String,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: String,
    pub role: Option<Lenient<Role>>,
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub company_name: String,
    pub description: String,
    #[validate(custom(function = "validate_optional_url"))]
    pub website: String,
    #[validate(length(max = 20, message = "Ensure this field has no more than 20 characters."))]
    pub phone: String,
    pub city: String,
    pub founded_year: Option<Lenient<i32>>,
    pub team_size: Option<Lenient<i32>>,
    pub investment_range_min: Option<Lenient<Decimal>>,
    pub investment_range_max: Option<Lenient<Decimal>>,
    pub preferred_industries: String,
    pub region: Option<Lenient<Region>>,
}

impl RegistrationRequest {
    /// Runs every field rule and collects all failures.
    ///
    /// The email is normalized first, so the returned errors and the stored
    /// account agree on the address.
    pub fn validate_all(&mut self) -> Result<(), FieldErrors> {
        self.email = normalize_email(&self.email);

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        for (field, value) in [
            ("email", &self.email),
            ("password", &self.password),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.trim().is_empty() && !errors.contains(field) {
                errors.add(field, REQUIRED);
            }
        }

        if !errors.contains("password")
            && let Err(e) = validate_password_not_similar(&self.password, &self.email)
            && let Some(message) = e.message
        {
            errors.add("password", message);
        }

        let role = resolve_optional(&mut errors, "role", &self.role, Expected::Choice);
        resolve_optional(&mut errors, "region", &self.region, Expected::Choice);
        let founded_year =
            resolve_optional(&mut errors, "founded_year", &self.founded_year, Expected::Integer);
        let team_size =
            resolve_optional(&mut errors, "team_size", &self.team_size, Expected::Integer);
        let min = resolve_optional(
            &mut errors,
            "investment_range_min",
            &self.investment_range_min,
            Expected::Number,
        );
        let max = resolve_optional(
            &mut errors,
            "investment_range_max",
            &self.investment_range_max,
            Expected::Number,
        );

        if founded_year.is_some_and(|year| !(1800..=2100).contains(&year)) {
            errors.add("founded_year", "Enter a valid year.");
        }
        if team_size.is_some_and(|size| size < 0) {
            errors.add("team_size", "Ensure this value is greater than or equal to 0.");
        }

        match role {
            None if self.role.is_none() => errors.add("role", REQUIRED),
            None => {}
            Some(Role::Startup) => {
                if self.company_name.trim().is_empty() {
                    errors.add("company_name", "Company name is required for startups.");
                }
            }
            Some(Role::Investor) => {
                if self.investment_range_min.is_none() {
                    errors.add(
                        "investment_range_min",
                        "Minimum investment is required for investors.",
                    );
                }
            }
        }

        for (field, value) in [("investment_range_min", min), ("investment_range_max", max)] {
            if value.is_some_and(|v| v < Decimal::ZERO) {
                errors.add(field, "Ensure this value is greater than or equal to 0.");
            }
            check_money(&mut errors, field, value);
        }

        if let (Some(min), Some(max)) = (min, max)
            && max < min
        {
            errors.add(
                "investment_range_max",
                "Maximum investment must be greater than or equal to minimum investment.",
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn role(&self) -> Option<Role> {
        parsed(&self.role)
    }

    fn parsed_founded_year(&self) -> Option<i32> {
        parsed(&self.founded_year)
    }

    fn parsed_team_size(&self) -> Option<i32> {
        parsed(&self.team_size)
    }

    fn parsed_range(&self) -> (Option<Decimal>, Option<Decimal>) {
        (
            parsed(&self.investment_range_min),
            parsed(&self.investment_range_max),
        )
    }
}

fn parsed<T: Copy>(value: &Option<Lenient<T>>) -> Option<T> {
    value.as_ref().and_then(Lenient::parsed).copied()
}

#[derive(Debug)]
pub enum RegistrationOutcome {
    Created(User),
    /// The email already belongs to an account; nothing was written.
    Duplicate,
}

/// Creates the inactive user and its role profile.
///
/// The request must have passed [`RegistrationRequest::validate_all`]. The
/// password is hashed before the duplicate check so both outcomes cost the
/// same.
#[instrument(skip_all, fields(email = %req.email, role = ?req.role()))]
pub async fn register(
    db_pool: &PgPool,
    req: &RegistrationRequest,
) -> Result<RegistrationOutcome, AppError> {
    let Some(role) = req.role() else {
        let mut errors = FieldErrors::new();
        errors.add("role", REQUIRED);
        return Err(AppError::Validation(errors));
    };

    let password_hash = hash_password_blocking(req.password.clone())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to hash password");
            AppError::Internal
        })?;

    let mut tx = db_pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&req.email)
    .bind(&password_hash)
    .bind(req.first_name.trim())
    .bind(req.last_name.trim())
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user) = user else {
        debug!("Email already registered");
        tx.rollback().await?;
        return Ok(RegistrationOutcome::Duplicate);
    };

    match role {
        Role::Startup => {
            sqlx::query(
                r#"
                INSERT INTO startup_profiles
                    (user_id, company_name, description, founded_year, team_size,
                     website, email, phone, city)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(user.id)
            .bind(req.company_name.trim())
            .bind(&req.description)
            .bind(req.parsed_founded_year())
            .bind(req.parsed_team_size())
            .bind(&req.website)
            .bind(&user.email)
            .bind(&req.phone)
            .bind(&req.city)
            .execute(&mut *tx)
            .await?;
        }
        Role::Investor => {
            let (range_min, range_max) = req.parsed_range();
            sqlx::query(
                r#"
                INSERT INTO investor_profiles
                    (user_id, company_name, full_name, description, investment_range_min,
                     investment_range_max, preferred_industries, website, email, phone,
                     region, city)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(user.id)
            .bind(req.company_name.trim())
            .bind(user.full_name())
            .bind(&req.description)
            .bind(range_min.unwrap_or_default())
            .bind(range_max)
            .bind(&req.preferred_industries)
            .bind(&req.website)
            .bind(&user.email)
            .bind(&req.phone)
            .bind(parsed(&req.region).unwrap_or_default())
            .bind(&req.city)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    info!(user_id = %user.id, %role, "Registered new account");
    Ok(RegistrationOutcome::Created(user))
}
