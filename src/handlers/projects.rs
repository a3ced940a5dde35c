//! # Project Handlers
//!
//! Public lookup of a project by slug, and project creation by the owner of a
//! startup profile.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::error::{AppError, AppResult, FieldErrors};
use crate::middleware::AuthUser;
use crate::models::{AppState, NewProject, Project, ProjectStatus, ProjectVisibility, StartupProfile};
use crate::utils::validator::{
    Expected, Lenient, check_money, resolve, resolve_optional, validate_currency, validate_slug,
};

fn default_currency() -> String {
    "UAH".to_string()
}

/// Request payload for creating a project
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(
        length(max = 50, message = "Ensure this field has no more than 50 characters."),
        custom(function = "validate_slug")
    )]
    pub slug: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Lenient<ProjectStatus>,
    pub target_amount: Option<Lenient<Decimal>>,
    #[serde(default)]
    pub raised_amount: Lenient<Decimal>,
    #[serde(default = "default_currency")]
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Lenient<ProjectVisibility>,
}

impl CreateProjectRequest {
    fn validate_all(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        resolve(&mut errors, "status", &self.status, Expected::Choice);
        resolve(&mut errors, "visibility", &self.visibility, Expected::Choice);

        if self.target_amount.is_none() {
            errors.add("target_amount", "This field is required.");
        }
        let target = resolve_optional(
            &mut errors,
            "target_amount",
            &self.target_amount,
            Expected::Number,
        );
        let raised = resolve(&mut errors, "raised_amount", &self.raised_amount, Expected::Number);
        for (field, value) in [("target_amount", target), ("raised_amount", raised)] {
            if value.is_some_and(|v| v < Decimal::ZERO) {
                errors.add(field, "Ensure this value is greater than or equal to 0.");
            }
            check_money(&mut errors, field, value);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn joined_tags(&self) -> String {
        self.tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// GET /api/projects/{slug}/
///
/// # Returns
///
/// - `200 OK` - The project
/// - `404 Not Found` - No project with this slug
#[instrument(skip_all, fields(slug = %slug, request_id = %uuid::Uuid::new_v4()))]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<Json<Project>> {
    Project::find_by_slug(&state.db_pool, &slug)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Not found."))
}

/// Creates a project for the caller's startup profile.
///
/// POST /api/projects/
///
/// # Returns
///
/// - `201 Created` - The new project
/// - `400 Bad Request` - Field errors, including a slug that is already taken
/// - `401 Unauthorized` - Missing or invalid access token
/// - `403 Forbidden` - The caller has no startup profile
#[instrument(
    skip_all,
    fields(
        user_id = %user.user_id,
        request_id = %uuid::Uuid::new_v4()
    )
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let Some(startup) = StartupProfile::find_by_user(&state.db_pool, user.user_id).await? else {
        warn!("Project creation by a user without startup profile");
        return Err(AppError::Forbidden("Only startups can create projects."));
    };

    let Json(payload) = payload?;
    if let Err(errors) = payload.validate_all() {
        debug!(fields = ?errors, "Project payload rejected");
        return Err(AppError::Validation(errors));
    }

    let tags = payload.joined_tags();
    let created = Project::create(
        &state.db_pool,
        NewProject {
            startup_id: startup.id,
            title: payload.title.trim(),
            slug: &payload.slug,
            short_description: &payload.short_description,
            description: &payload.description,
            status: payload.status.value_or_default(),
            target_amount: payload
                .target_amount
                .as_ref()
                .map(Lenient::value_or_default)
                .unwrap_or_default(),
            raised_amount: payload.raised_amount.value_or_default(),
            currency: &payload.currency,
            tags: &tags,
            visibility: payload.visibility.value_or_default(),
        },
    )
    .await;

    match created {
        Ok(project) => {
            info!(project_id = project.id, slug = %project.slug, "Project created");
            Ok((StatusCode::CREATED, Json(project)))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let mut errors = FieldErrors::new();
            errors.add("slug", "Project with this slug already exists.");
            Err(AppError::Validation(errors))
        }
        Err(e) => Err(AppError::Db(e)),
    }
}
