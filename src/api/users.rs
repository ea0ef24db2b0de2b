use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, validation};
use crate::services::{CurrentUser, UserProfile};

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,

    // Accepted only so we can reject them with a pointer to the right route.
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// GET /users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = state.shared.auth_service.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PATCH /users/me
/// Update name and/or email. Password changes go through the dedicated
/// password route.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    if payload.password.is_some() || payload.password_confirm.is_some() {
        return Err(ApiError::validation(
            "This route is not for password updates. Please use /api/auth/password",
        ));
    }
    if let Some(email) = &payload.email {
        validation::validate_email(email)?;
    }
    if let Some(name) = &payload.name {
        validation::validate_required("Name", name)?;
    }

    let profile = state
        .shared
        .auth_service
        .update_profile(user.id, payload.name, payload.email)
        .await?;

    Ok(Json(ApiResponse::success(profile)))
}

/// DELETE /users/me
/// Soft delete; the account disappears from logins and listings but the
/// row stays for order history.
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.shared.auth_service.deactivate(user.id).await?;
    tracing::info!(user_id = user.id, "Account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users (admin)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>, ApiError> {
    let users = state.shared.auth_service.list_users().await?;
    Ok(Json(ApiResponse::success(users)))
}
