use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, validation};
use crate::db::{BestDayRow, TopCustomerRow};
use crate::services::{CurrentUser, NewOrder, OrderDto, OrderUpdate};

#[derive(Debug, Serialize)]
pub struct BestDayResponse {
    /// `None` when no order was completed inside the window.
    pub best_day: Option<BestDayRow>,
}

/// POST /orders
/// The order is always created for the caller; totals come from the
/// menu, never from the request body.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .shared
        .order_service
        .create_order(user.id, &user.email, payload)
        .await?;

    tracing::info!(
        order_id = created.id,
        user_id = user.id,
        total = created.total_price,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// GET /orders/mine
pub async fn list_my_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<OrderDto>>>, ApiError> {
    let orders = state.shared.order_service.list_mine(user.id).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /orders (admin)
/// Pending orders first, newest first within each group.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<OrderDto>>>, ApiError> {
    let orders = state.shared.order_service.list_all().await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /orders/{id} (admin)
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDto>>, ApiError> {
    validation::validate_id("order", id)?;
    let order = state.shared.order_service.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// PATCH /orders/{id} (admin)
/// Flipping `is_done` to true emails the customer a completion notice.
pub async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<OrderUpdate>,
) -> Result<Json<ApiResponse<OrderDto>>, ApiError> {
    validation::validate_id("order", id)?;
    let updated = state.shared.order_service.update_order(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /orders/{id} (admin)
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_id("order", id)?;
    state.shared.order_service.delete_order(id).await?;
    tracing::info!(order_id = id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /orders/reports/top-customers (admin)
pub async fn top_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TopCustomerRow>>>, ApiError> {
    let customers = state.shared.order_service.top_customers().await?;
    Ok(Json(ApiResponse::success(customers)))
}

/// GET /orders/reports/best-day (admin)
pub async fn best_day(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<BestDayResponse>>, ApiError> {
    let best_day = state.shared.order_service.best_day().await?;
    Ok(Json(ApiResponse::success(BestDayResponse { best_day })))
}
