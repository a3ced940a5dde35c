//! # Notification Handlers
//!
//! The investor inbox. Both endpoints require an investor profile.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{AppState, InvestorProfile, Notification};
use crate::utils::pagination::{Page, PageQuery, PageRequest};

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub unread: Option<String>,
}

impl NotificationQuery {
    fn unread_only(&self) -> bool {
        matches!(
            self.unread.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("1" | "true" | "yes")
        )
    }
}

async fn investor_id(state: &AppState, user: &AuthUser) -> AppResult<i64> {
    InvestorProfile::id_for_user(&state.db_pool, user.user_id)
        .await?
        .ok_or_else(|| {
            warn!("Notification access by a user without investor profile");
            AppError::Forbidden("Only investors have notifications.")
        })
}

/// GET /api/notifications/?unread=&page=&page_size=
///
/// The caller's notifications, newest first.
///
/// # Returns
///
/// - `200 OK` - `{count, next, previous, results}`
/// - `401 Unauthorized` - Missing or invalid access token
/// - `403 Forbidden` - The caller is not an investor
/// - `404 Not Found` - A page outside the result set
#[instrument(
    skip_all,
    fields(
        user_id = %user.user_id,
        request_id = %uuid::Uuid::new_v4()
    )
)]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Page<Notification>>> {
    let investor_id = investor_id(&state, &user).await?;
    let unread_only = query.unread_only();
    let request = PageRequest::try_from(PageQuery {
        page: query.page,
        page_size: query.page_size,
    })?;

    let count = Notification::count_for_investor(&state.db_pool, investor_id, unread_only).await?;
    request.ensure_in_range(count)?;

    let notifications = Notification::list_for_investor(
        &state.db_pool,
        investor_id,
        unread_only,
        request.limit(),
        request.offset(),
    )
    .await?;
    debug!(count, unread_only, "Listing notifications");

    Ok(Json(Page::new(notifications, count, request)))
}

/// POST /api/notifications/{id}/read/
///
/// # Returns
///
/// - `200 OK` - The updated notification
/// - `401 Unauthorized` - Missing or invalid access token
/// - `403 Forbidden` - The caller is not an investor
/// - `404 Not Found` - No such notification for this investor
#[instrument(
    skip_all,
    fields(
        user_id = %user.user_id,
        notification_id = %id,
        request_id = %uuid::Uuid::new_v4()
    )
)]
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Notification>> {
    let investor_id = investor_id(&state, &user).await?;
    let id = id
        .parse::<i64>()
        .map_err(|_| AppError::NotFound("Not found."))?;

    Notification::mark_read(&state.db_pool, id, investor_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Not found."))
}
