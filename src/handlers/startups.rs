//! # Startup Handlers
//!
//! Public, unauthenticated reads: the startup profile card and the paginated
//! list of a startup's projects.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::models::{AppState, Project, StartupProfile};
use crate::utils::pagination::{Page, PageQuery, PageRequest};
use crate::utils::text::{absolute_media_url, split_tags};

/// Public view of a startup profile
#[derive(Debug, Serialize, Deserialize)]
pub struct StartupPublicProfile {
    pub id: i64,
    pub company_name: String,
    pub description: String,
    pub founded_year: Option<i32>,
    pub team_size: Option<i32>,
    pub website: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub logo_url: Option<String>,
    pub tags: Vec<String>,
    pub followers_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StartupPublicProfile {
    fn new(profile: StartupProfile, followers_count: i64, headers: &HeaderMap) -> Self {
        Self {
            logo_url: absolute_media_url(headers, &profile.logo),
            tags: split_tags(&profile.partners_brands),
            id: profile.id,
            company_name: profile.company_name,
            description: profile.description,
            founded_year: profile.founded_year,
            team_size: profile.team_size,
            website: profile.website,
            email: profile.email,
            phone: profile.phone,
            city: profile.city,
            followers_count,
            created_at: profile.created_at,
        }
    }
}

/// Parses a numeric path id; anything else is a 404 like an unknown id.
fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound("Not found."))
}

async fn find_startup(state: &AppState, raw_id: &str) -> AppResult<StartupProfile> {
    StartupProfile::find_by_id(&state.db_pool, parse_id(raw_id)?)
        .await?
        .ok_or(AppError::NotFound("Not found."))
}

/// GET /api/startups/{id}/
///
/// # Returns
///
/// - `200 OK` - [`StartupPublicProfile`]
/// - `404 Not Found` - Unknown startup
#[instrument(skip_all, fields(startup_id = %id, request_id = %uuid::Uuid::new_v4()))]
pub async fn get_startup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<StartupPublicProfile>> {
    let profile = find_startup(&state, &id).await?;
    let followers_count = StartupProfile::followers_count(&state.db_pool, profile.id).await?;
    debug!(startup_id = profile.id, followers_count, "Serving startup profile");

    Ok(Json(StartupPublicProfile::new(
        profile,
        followers_count,
        &headers,
    )))
}

/// GET /api/startups/{id}/projects/?page=&page_size=
///
/// Projects of one startup, ordered by id.
///
/// # Returns
///
/// - `200 OK` - `{count, next, previous, results}`
/// - `404 Not Found` - Unknown startup, or a page outside the result set
#[instrument(skip_all, fields(startup_id = %id, request_id = %uuid::Uuid::new_v4()))]
pub async fn list_startup_projects(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Project>>> {
    let startup = find_startup(&state, &id).await?;
    let request = PageRequest::try_from(query)?;

    let count = Project::count_for_startup(&state.db_pool, startup.id).await?;
    request.ensure_in_range(count)?;

    let projects = Project::list_for_startup(
        &state.db_pool,
        startup.id,
        request.limit(),
        request.offset(),
    )
    .await?;

    Ok(Json(Page::new(projects, count, request)))
}
