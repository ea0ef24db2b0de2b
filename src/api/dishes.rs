use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, validation};
use crate::db::{DishPatch, NewDish, TopDishRow};
use crate::services::{CurrentUser, DishDto, DishListing, DishView};

fn is_admin(user: Option<&CurrentUser>) -> bool {
    user.is_some_and(CurrentUser::is_admin)
}

/// GET /dishes
/// Admins see the full records; everyone else gets the public menu view.
pub async fn list_dishes(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<ApiResponse<DishListing>>, ApiError> {
    let admin_view = is_admin(user.as_deref());
    let listing = state.shared.dish_service.list_dishes(admin_view).await?;
    Ok(Json(ApiResponse::success(listing)))
}

/// GET /dishes/top
pub async fn top_dishes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TopDishRow>>>, ApiError> {
    let top = state.shared.dish_service.top_dishes().await?;
    Ok(Json(ApiResponse::success(top)))
}

/// GET /dishes/{id}
pub async fn get_dish(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<DishView>>, ApiError> {
    validation::validate_id("dish", id)?;
    let admin_view = is_admin(user.as_deref());
    let dish = state.shared.dish_service.get_dish(id, admin_view).await?;
    Ok(Json(ApiResponse::success(dish)))
}

/// POST /dishes (admin)
pub async fn create_dish(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewDish>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.shared.dish_service.create_dish(payload).await?;
    tracing::info!(dish_id = created.id, "Dish created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// PATCH /dishes/{id} (admin)
pub async fn update_dish(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<DishPatch>,
) -> Result<Json<ApiResponse<DishDto>>, ApiError> {
    validation::validate_id("dish", id)?;
    let updated = state.shared.dish_service.update_dish(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /dishes/{id} (admin)
pub async fn delete_dish(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_id("dish", id)?;
    state.shared.dish_service.delete_dish(id).await?;
    tracing::info!(dish_id = id, "Dish deleted");
    Ok(StatusCode::NO_CONTENT)
}
